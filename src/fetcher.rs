use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::OzonApiConfig;
use crate::models::ApiPage;
use crate::settings::Settings;
use crate::utils::error::{AppError, Result};

/// Client for the seller pricing endpoint.
///
/// Only the first page of results is requested; the cursor returned by the
/// API is not followed.
#[derive(Clone)]
pub struct PriceFetcher {
    client: Client,
    config: OzonApiConfig,
}

impl PriceFetcher {
    pub fn new(config: OzonApiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: OzonApiConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, settings: &Settings) -> Result<ApiPage> {
        if !settings.has_marketplace_credentials() {
            error!("Ozon API credentials not configured");
            return Err(AppError::credentials_missing("Ozon API"));
        }

        let payload = json!({
            "cursor": "",
            "filter": {
                "visibility": settings.visibility,
            },
            "limit": self.config.page_limit,
        });

        debug!(
            "Requesting prices from {} (visibility {})",
            self.config.prices_url, settings.visibility
        );

        let response = self
            .client
            .post(&self.config.prices_url)
            .header("Client-Id", &settings.client_id)
            .header("Api-Key", &settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Error making API request: {}", e);
                AppError::from(e)
            })?;

        let status = response.status();
        info!("API status code: {}", status.as_u16());

        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            error!("API error: {}", body);
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Malformed pricing response: {}", e);
            AppError::AnalysisData(format!("malformed pricing response: {}", e))
        })
    }
}
