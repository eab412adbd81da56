// Shared helpers for the integration tests

pub mod fetcher_tests;
pub mod notifier_tests;

use ozon_price_watcher::{AppConfig, Settings, SettingsStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

pub const PRICES_PATH: &str = "/v5/product/info/prices";
pub const BOT_TOKEN: &str = "123456:test-token";
pub const TELEGRAM_PATH: &str = "/bot123456:test-token/sendMessage";

/// Configuration pointing every external API at the mock server.
pub fn test_config(server: &MockServer, dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.settings_path = dir.path().join("ozon_monitor_config.json").display().to_string();
    config.ozon.prices_url = format!("{}{}", server.uri(), PRICES_PATH);
    config.ozon.seller_url = server.uri();
    config.telegram.api_base = server.uri();
    config.telegram.part_delay_ms = 0;
    config
}

pub fn configured_settings() -> Settings {
    Settings {
        client_id: "12345".to_string(),
        api_key: "test-api-key".to_string(),
        telegram_bot_token: BOT_TOKEN.to_string(),
        telegram_channel: "@price_alerts".to_string(),
        ..Settings::default()
    }
}

pub fn write_settings(config: &AppConfig, settings: &Settings) {
    assert!(SettingsStore::new(&config.settings_path).save(settings));
}

/// One product with a lower minimum price, one consistent product.
pub fn sample_page() -> Value {
    json!({
        "cursor": "WyIxMjM0NTYiXQ==",
        "total": 2,
        "items": [
            {
                "offer_id": "SKU-RED",
                "product_id": 214591,
                "price": {
                    "currency_code": "RUB",
                    "marketing_seller_price": "1490.00",
                    "min_price": "1390.00",
                    "marketing_price": "1490.00",
                    "price": "0"
                }
            },
            {
                "offer_id": "SKU-BLUE",
                "product_id": 214592,
                "price": {
                    "currency_code": "RUB",
                    "marketing_seller_price": 990,
                    "min_price": 990,
                    "marketing_price": 0,
                    "price": 990
                }
            }
        ]
    })
}

pub fn too_long_body() -> Value {
    json!({
        "ok": false,
        "error_code": 400,
        "description": "Bad Request: message is too long"
    })
}

/// Texts of every `sendMessage` call the mock server received, in order.
pub async fn telegram_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == TELEGRAM_PATH)
        .filter_map(|request| request.body_json::<Value>().ok())
        .filter_map(|body| body["text"].as_str().map(str::to_string))
        .collect()
}
