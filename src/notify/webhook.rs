// src/notify/webhook.rs

//! Generic JSON webhook notifier.
//!
//! POSTs `{"text": "..."}` to a configured endpoint; compatible with Slack
//! incoming webhooks and most chat bridges.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::notify::Notifier;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Sends messages to an arbitrary webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let payload = WebhookPayload { text: message };
        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(
                "webhook",
                format!("endpoint returned {status}: {body}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload { text: "hello" };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"text":"hello"}"#);
    }
}
