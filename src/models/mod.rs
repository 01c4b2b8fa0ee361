// src/models/mod.rs

//! Domain models for the watcher application.

mod config;
mod post;

// Re-export all public types
pub use config::{Config, HttpConfig, LedgerConfig, NotifyChannel, NotifyConfig, SourceConfig};
pub use post::{Post, RawRow, RowKind};
