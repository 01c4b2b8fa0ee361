// src/notify/telegram.rs

//! Telegram Bot API notifier.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::notify::Notifier;

const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Sends messages to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, token: String, chat_id: String) -> Self {
        Self {
            client,
            token,
            chat_id,
        }
    }

    /// Build from `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`.
    ///
    /// Returns `None` when either variable is absent or empty; credentials
    /// never come from the config file.
    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        let token = std::env::var(TOKEN_VAR).ok().filter(|s| !s.is_empty())?;
        let chat_id = std::env::var(CHAT_ID_VAR).ok().filter(|s| !s.is_empty())?;
        Some(Self::new(client, token, chat_id))
    }

    fn api_url(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let body = SendMessageBody {
            chat_id: &self.chat_id,
            text: message,
            disable_web_page_preview: true,
        };

        let response = self.client.post(self.api_url()).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(
                "telegram",
                format!("API returned {status}: {body}"),
            ));
        }

        // The API reports application-level failures with HTTP 200 and
        // "ok": false in the body
        let json: serde_json::Value = response.json().await?;
        if !json.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            let description = json
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(AppError::notify("telegram", description));
        }

        Ok(())
    }
}
