//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::ledger::PersistPolicy;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Gallery listing source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Notified-id ledger settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            return Err(AppError::validation("source.base_url is empty"));
        }
        if self.source.pages == 0 {
            return Err(AppError::validation("source.pages must be >= 1"));
        }
        if self.source.row_selector.trim().is_empty() {
            return Err(AppError::validation("source.row_selector is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.notify.max_message_len == 0 {
            return Err(AppError::validation("notify.max_message_len must be > 0"));
        }
        if self.notify.channel == NotifyChannel::Webhook && self.notify.webhook_url.is_none() {
            return Err(AppError::validation(
                "notify.webhook_url is required when notify.channel = \"webhook\"",
            ));
        }
        Ok(())
    }
}

/// Gallery listing source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the listing, without the page parameter
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Number of listing pages to scan per run.
    /// Keep this small (1-3): the listing is volatile and new posts push
    /// old ones below the window between runs anyway.
    #[serde(default = "defaults::pages")]
    pub pages: u32,

    /// CSS selector matching one link per listing row
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Attribute on the matched element holding the post link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    /// Whether pinned/administrative rows are eligible for notification
    #[serde(default)]
    pub include_pinned: bool,

    /// Title keywords to notify on; empty means every new post matches
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            pages: defaults::pages(),
            row_selector: defaults::row_selector(),
            link_attr: defaults::link_attr(),
            include_pinned: false,
            keywords: Vec::new(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Notified-id ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the ledger file
    #[serde(default = "defaults::ledger_path")]
    pub path: PathBuf,

    /// When to write the ledger back to disk
    #[serde(default)]
    pub policy: PersistPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: defaults::ledger_path(),
            policy: PersistPolicy::default(),
        }
    }
}

/// Notification channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannel {
    /// Telegram Bot API; credentials come from TELEGRAM_BOT_TOKEN and
    /// TELEGRAM_CHAT_ID environment variables
    #[default]
    Telegram,
    /// Generic JSON webhook POST
    Webhook,
    /// Print to stdout (no credentials needed)
    Console,
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Delivery channel
    #[serde(default)]
    pub channel: NotifyChannel,

    /// Webhook endpoint, required when channel = "webhook"
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Message template; placeholders: {id}, {title}, {link}
    #[serde(default = "defaults::message_template")]
    pub message_template: String,

    /// Maximum rendered message length; longer messages are truncated
    /// with a marker
    #[serde(default = "defaults::max_message_len")]
    pub max_message_len: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel: NotifyChannel::default(),
            webhook_url: None,
            message_template: defaults::message_template(),
            max_message_len: defaults::max_message_len(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn base_url() -> String {
        "https://gall.dcinside.com/board/lists/?id=comic_new6&exception_mode=recommend".into()
    }
    pub fn pages() -> u32 {
        1
    }
    pub fn row_selector() -> String {
        "td.gall_tit a".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; gallwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        5
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Ledger defaults
    pub fn ledger_path() -> PathBuf {
        PathBuf::from(".cache/notified_posts.txt")
    }

    // Notify defaults
    pub fn message_template() -> String {
        "[{title}]({link})".into()
    }
    pub fn max_message_len() -> usize {
        4000
    }
}
