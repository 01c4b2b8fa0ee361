//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use url::{extract_post_id, resolve_url};
