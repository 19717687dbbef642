//! Outbound calls to the Telegram Bot API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    pub text: String,
    pub reply_markup: InlineKeyboardMarkup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// A link button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

/// Minimal Bot API client. Holds the token inside `base_url`, so neither is
/// ever logged.
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str, api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base_url.trim_end_matches('/'), bot_token),
        })
    }

    pub fn send_message_url(&self) -> String {
        format!("{}/sendMessage", self.base_url)
    }

    /// POST the payload once. Non-2xx responses are errors.
    pub async fn send_message(&self, payload: &ReplyPayload) -> Result<StatusCode> {
        debug!("sendMessage to chat_id={}", payload.chat_id);

        let response = self
            .client
            .post(self.send_message_url())
            .json(payload)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to send request to Telegram")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error ({}): {}", status, error_body);
        }

        Ok(status)
    }
}
