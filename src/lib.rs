// src/lib.rs

//! gallwatch library
//!
//! Polls a gallery's listing pages and notifies once per new post,
//! keeping a durable ledger of already-notified identifiers.

pub mod error;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod utils;
