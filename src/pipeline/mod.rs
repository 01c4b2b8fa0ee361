//! Pipeline entry points for watcher operations.
//!
//! - `run_watch`: one scan → filter → notify → persist cycle

mod run;

pub use run::{run_watch, RunReport};
