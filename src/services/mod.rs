//! Service layer for the watcher application.
//!
//! - Listing page fetch+parse (`HttpPageSource`)
//! - Listing scan with cross-page dedup (`ListingScanner`)

mod listing;

pub use listing::{HttpPageSource, ListingScanner, PageSource, ScanOutcome, SkipReason, SkippedRow};
