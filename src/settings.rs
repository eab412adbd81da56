//! User-editable monitor settings and their JSON-backed store.
//!
//! The settings document is a flat key-value JSON object. Loading is
//! self-healing: keys missing from the document are filled in from
//! [`Settings::default`], and keys this version does not know about are
//! carried along so that saving never drops them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use validator::Validate;

use crate::utils::error::{AppError, Result};

pub const DEFAULT_SETTINGS_FILE: &str = "ozon_monitor_config.json";

pub const MIN_INTERVAL_MINUTES: u32 = 1;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

/// Marketplace-side filter selecting which products the pricing API returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    All,
    InSale,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::All => write!(f, "ALL"),
            Visibility::InSale => write!(f, "IN_SALE"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Settings {
    // Ozon seller API credentials
    pub client_id: String,
    pub api_key: String,

    // Telegram delivery
    pub telegram_bot_token: String,
    pub telegram_channel: String,

    // Optional price fields to compare against the seller price
    pub check_min_price: bool,
    pub check_marketing_price: bool,
    pub check_price: bool,

    pub visibility: Visibility,

    /// Minutes between periodic checks.
    #[validate(range(min = 1, max = 1440))]
    pub timer_interval: u32,

    pub auto_start: bool,
    pub log_level: String,

    /// Keys present in the document that this version does not use.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            api_key: String::new(),
            telegram_bot_token: String::new(),
            telegram_channel: String::new(),
            check_min_price: true,
            check_marketing_price: true,
            check_price: true,
            visibility: Visibility::All,
            timer_interval: 60,
            auto_start: false,
            log_level: "INFO".to_string(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    pub fn has_marketplace_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.api_key.is_empty()
    }

    pub fn has_telegram_credentials(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_channel.is_empty()
    }

    /// Wait between periodic checks, clamped into the supported range.
    pub fn interval(&self) -> Duration {
        let minutes = self
            .timer_interval
            .clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);
        Duration::from_secs(u64::from(minutes) * 60)
    }

    /// Merges a raw JSON document over the defaults.
    ///
    /// Returns the merged settings and whether any default had to be filled in.
    pub fn merge_over_defaults(document: Value) -> Result<(Self, bool)> {
        let Value::Object(mut object) = document else {
            return Err(AppError::Settings(
                "settings document must be a JSON object".to_string(),
            ));
        };

        let defaults = match serde_json::to_value(Settings::default())? {
            Value::Object(map) => map,
            _ => return Err(AppError::Internal("default settings are not an object".to_string())),
        };

        let mut backfilled = false;
        for (key, value) in defaults {
            if !object.contains_key(&key) {
                object.insert(key, value);
                backfilled = true;
            }
        }

        let settings = serde_json::from_value(Value::Object(object))?;
        Ok((settings, backfilled))
    }
}

/// Durable store for [`Settings`].
///
/// Neither operation returns an error: failures are logged and turned into
/// defaults (`load`) or `false` (`save`).
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            info!("Settings file {} not found, writing defaults", self.path.display());
            let defaults = Settings::default();
            self.save(&defaults);
            return defaults;
        }

        match self.read() {
            Ok((settings, backfilled)) => {
                if backfilled {
                    info!("Backfilled missing settings keys in {}", self.path.display());
                    self.save(&settings);
                }
                settings
            }
            Err(e) => {
                error!("Error loading settings from {}: {}", self.path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> bool {
        match self.write(settings) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error saving settings to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn read(&self) -> Result<(Settings, bool)> {
        let raw = std::fs::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&raw)?;
        Settings::merge_over_defaults(document)
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_FILE)
    }
}
