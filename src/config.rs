use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::settings::DEFAULT_SETTINGS_FILE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub settings_path: String,
    pub ozon: OzonApiConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonApiConfig {
    pub prices_url: String,
    pub seller_url: String,
    pub page_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_base: String,
    pub max_message_length: usize,
    pub part_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: DEFAULT_SETTINGS_FILE.to_string(),
            ozon: OzonApiConfig {
                prices_url: "https://api-seller.ozon.ru/v5/product/info/prices".to_string(),
                seller_url: "https://seller.ozon.ru".to_string(),
                page_limit: 100,
            },
            telegram: TelegramConfig {
                api_base: "https://api.telegram.org".to_string(),
                max_message_length: 4000,
                part_delay_ms: 1000,
            },
            logging: LoggingConfig {
                directory: "logs".to_string(),
                file_name: "price_monitor.log".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = AppConfig::default();

        let s = Config::builder()
            // Built-in defaults
            .set_default("settings_path", defaults.settings_path)?
            .set_default("ozon.prices_url", defaults.ozon.prices_url)?
            .set_default("ozon.seller_url", defaults.ozon.seller_url)?
            .set_default("ozon.page_limit", i64::from(defaults.ozon.page_limit))?
            .set_default("telegram.api_base", defaults.telegram.api_base)?
            .set_default(
                "telegram.max_message_length",
                defaults.telegram.max_message_length as i64,
            )?
            .set_default("telegram.part_delay_ms", defaults.telegram.part_delay_ms as i64)?
            .set_default("logging.directory", defaults.logging.directory)?
            .set_default("logging.file_name", defaults.logging.file_name)?
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "OZON_WATCHER_"
            .add_source(Environment::with_prefix("OZON_WATCHER").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings_path.trim().is_empty() {
            return Err(ConfigError::Message("settings_path must not be empty".into()));
        }

        if Url::parse(&self.ozon.prices_url).is_err() {
            return Err(ConfigError::Message("Invalid ozon.prices_url".into()));
        }

        if Url::parse(&self.ozon.seller_url).is_err() {
            return Err(ConfigError::Message("Invalid ozon.seller_url".into()));
        }

        if self.ozon.page_limit == 0 {
            return Err(ConfigError::Message("ozon.page_limit must be greater than 0".into()));
        }

        if Url::parse(&self.telegram.api_base).is_err() {
            return Err(ConfigError::Message("Invalid telegram.api_base".into()));
        }

        if self.telegram.max_message_length == 0 {
            return Err(ConfigError::Message(
                "telegram.max_message_length must be greater than 0".into(),
            ));
        }

        if self.logging.file_name.trim().is_empty() {
            return Err(ConfigError::Message("logging.file_name must not be empty".into()));
        }

        Ok(())
    }
}
