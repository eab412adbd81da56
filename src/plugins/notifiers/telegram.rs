use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::TelegramConfig;
use crate::plugins::traits::NotifierPlugin;
use crate::settings::Settings;

const TOO_LONG_MARKER: &str = "message is too long";

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

enum Delivery {
    Sent,
    TooLong,
    Failed,
}

/// Sends reports through the Telegram Bot API `sendMessage` method.
///
/// A message the API rejects as too long is split at line boundaries and
/// every part is sent in order, pausing between parts to stay under the
/// rate limit.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    max_message_length: usize,
    part_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            max_message_length: config.max_message_length.max(1),
            part_delay: Duration::from_millis(config.part_delay_ms),
        }
    }

    pub fn with_part_delay(mut self, delay: Duration) -> Self {
        self.part_delay = delay;
        self
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, token)
    }

    async fn post(&self, settings: &Settings, text: &str) -> Delivery {
        let payload = SendMessagePayload {
            chat_id: &settings.telegram_channel,
            text,
            parse_mode: "HTML",
        };

        let response = match self
            .client
            .post(self.endpoint(&settings.telegram_bot_token))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error sending Telegram message: {}", e);
                return Delivery::Failed;
            }
        };

        let status = response.status();
        if status.is_success() {
            info!("Telegram message sent successfully");
            return Delivery::Sent;
        }

        let body = response.text().await.unwrap_or_default();
        error!("Failed to send Telegram message ({}): {}", status, body);
        if body.to_lowercase().contains(TOO_LONG_MARKER) {
            Delivery::TooLong
        } else {
            Delivery::Failed
        }
    }

    async fn send_parts(&self, settings: &Settings, message: &str) -> bool {
        let parts = split_message(message, self.max_message_length);
        info!("Message too long, resending as {} parts", parts.len());

        let mut all_sent = true;
        for (index, part) in parts.iter().enumerate() {
            tokio::time::sleep(self.part_delay).await;
            match self.post(settings, part).await {
                Delivery::Sent => {}
                Delivery::TooLong | Delivery::Failed => {
                    warn!("Part {}/{} was not delivered", index + 1, parts.len());
                    all_sent = false;
                }
            }
        }
        all_sent
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn send(&self, settings: &Settings, message: &str) -> bool {
        if !settings.has_telegram_credentials() {
            warn!("Telegram credentials not configured");
            return false;
        }

        match self.post(settings, message).await {
            Delivery::Sent => true,
            Delivery::Failed => false,
            Delivery::TooLong => self.send_parts(settings, message).await,
        }
    }
}

/// Splits `message` into chunks of at most `max_length` characters.
///
/// Each cut happens at the last newline inside the window, which then starts
/// the next chunk, so concatenating the chunks gives back `message`. Without
/// a usable newline the cut is made at exactly `max_length` characters.
pub fn split_message(message: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    let mut parts = Vec::new();
    let mut rest = message;

    while rest.chars().count() > max_length {
        let window_end = rest
            .char_indices()
            .nth(max_length)
            .map_or(rest.len(), |(index, _)| index);

        // A newline at offset 0 would produce an empty chunk and no progress
        let cut = match rest[..window_end].rfind('\n') {
            Some(index) if index > 0 => index,
            _ => window_end,
        };

        let (head, tail) = rest.split_at(cut);
        parts.push(head.to_string());
        rest = tail;
    }

    parts.push(rest.to_string());
    parts
}
