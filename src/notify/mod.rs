// src/notify/mod.rs

//! Notification delivery backends.
//!
//! Every channel implements the one `Notifier` trait; the pipeline does not
//! care whether a message goes to Telegram, a webhook or stdout. A send
//! failure is an `Err` from `send` — the caller logs it and moves on, and
//! the post is retried on the next run because its id never enters the
//! ledger.

mod telegram;
mod webhook;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, NotifyChannel, NotifyConfig, Post};

pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

/// Marker appended when a message exceeds the configured length.
const TRUNCATION_MARKER: &str = "…";

/// Outbound delivery channel for new-post messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logging (e.g. "telegram").
    fn name(&self) -> &str;

    /// Deliver one rendered message. `Err` means the attempt failed and the
    /// post must not be marked notified.
    async fn send(&self, message: &str) -> Result<()>;
}

/// Render a post into a message, truncating to the configured bound.
pub fn render_message(post: &Post, config: &NotifyConfig) -> String {
    truncate(
        &post.format(&config.message_template),
        config.max_message_len,
    )
}

fn truncate(message: &str, max_len: usize) -> String {
    if message.chars().count() <= max_len {
        return message.to_string();
    }
    let keep = max_len.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = message.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Fallback notifier that prints to stdout.
///
/// Used when no channel credentials are configured, mirroring the
/// console-only mode operators use for a dry run.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, message: &str) -> Result<()> {
        println!("{message}");
        Ok(())
    }
}

/// Build the configured notifier.
///
/// Telegram falls back to console when the environment variables are not
/// set, so a run without credentials still shows what it would have sent.
pub fn create_notifier(config: &Config, client: reqwest::Client) -> Result<Box<dyn Notifier>> {
    match config.notify.channel {
        NotifyChannel::Telegram => match TelegramNotifier::from_env(client) {
            Some(notifier) => Ok(Box::new(notifier)),
            None => {
                log::warn!(
                    "TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set; printing to console instead"
                );
                Ok(Box::new(ConsoleNotifier))
            }
        },
        NotifyChannel::Webhook => {
            let url = config.notify.webhook_url.clone().ok_or_else(|| {
                crate::error::AppError::config("notify.webhook_url is not set")
            })?;
            Ok(Box::new(WebhookNotifier::new(client, url)))
        }
        NotifyChannel::Console => Ok(Box::new(ConsoleNotifier)),
    }
}
