// src/pipeline/run.rs

//! One watch cycle: scan the listing, filter against the ledger, deliver
//! notifications oldest-first, persist successes.
//!
//! The ledger invariant enforced here: an id is marked (and persisted) only
//! after its send reported success. A failed send leaves the id out so the
//! next run retries it. Delivery is oldest-first so that an interruption
//! mid-batch leaves the *earliest* posts flushed, and a restart skips as
//! little as possible.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ledger::{NotifiedLedger, PersistPolicy};
use crate::models::{Config, Post};
use crate::notify::{render_message, Notifier};
use crate::services::{ListingScanner, PageSource};

/// Summary of one watch run.
#[derive(Debug)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    /// Posts in the scan after dedup
    pub scanned: usize,
    /// Scan posts already present in the ledger
    pub already_notified: usize,
    /// New posts dropped by the keyword filter
    pub filtered_out: usize,
    /// Notification attempts made
    pub attempted: usize,
    /// Attempts that succeeded
    pub sent: usize,
    /// Attempts that failed (retried next run)
    pub failed: usize,
}

impl RunReport {
    fn log_summary(&self) {
        log::info!(
            "Run finished in {}ms: {} scanned, {} already notified, {} filtered out, {} sent, {} failed",
            (self.finished - self.started).num_milliseconds(),
            self.scanned,
            self.already_notified,
            self.filtered_out,
            self.sent,
            self.failed,
        );
    }
}

/// Keyword predicate between "new" and "to-notify".
///
/// Empty keyword list matches everything; otherwise a case-insensitive
/// substring match on the title.
fn matches_keywords(post: &Post, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title = post.title.to_lowercase();
    keywords.iter().any(|k| title.contains(&k.to_lowercase()))
}

/// Run one watch cycle.
///
/// Never fails for scan emptiness, send failures or a broken ledger file;
/// those are logged and reflected in the report. An `Err` here means the
/// run could not even be attempted.
pub async fn run_watch(
    config: &Config,
    source: &dyn PageSource,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    let started = Utc::now();

    let mut ledger = NotifiedLedger::load(&config.ledger.path).await;
    log::info!(
        "Loaded {} notified ids from {}",
        ledger.len(),
        ledger.path().display()
    );

    let scanner = ListingScanner::new(&config.source, &config.http);
    let outcome = scanner.scan(source).await;

    if outcome.page_failures > 0 {
        log::warn!("{} of {} pages failed to fetch", outcome.page_failures, config.source.pages);
    }
    for skipped in &outcome.skipped {
        log::debug!("Skipped row '{}': {}", skipped.href, skipped.reason);
    }

    let mut report = RunReport {
        started,
        finished: started,
        scanned: outcome.posts.len(),
        already_notified: 0,
        filtered_out: 0,
        attempted: 0,
        sent: 0,
        failed: 0,
    };

    if outcome.posts.is_empty() {
        log::info!("Scan returned no posts; nothing to do");
        report.finished = Utc::now();
        report.log_summary();
        return Ok(report);
    }

    let fresh = ledger.filter_new(&outcome.posts);
    report.already_notified = report.scanned - fresh.len();

    let to_notify: Vec<Post> = fresh
        .into_iter()
        .filter(|p| {
            let keep = matches_keywords(p, &config.source.keywords);
            if !keep {
                report.filtered_out += 1;
                log::debug!("Keyword filter dropped '{}' ({})", p.title, p.id);
            }
            keep
        })
        .collect();

    // Scan order is newest-first; deliver oldest-first so an interrupted
    // batch leaves the oldest posts already in the ledger
    for post in to_notify.iter().rev() {
        log::info!("New post {}: {}", post.id, post.title);
        report.attempted += 1;

        let message = render_message(post, &config.notify);
        match notifier.send(&message).await {
            Ok(()) => {
                report.sent += 1;
                ledger.mark_notified(&post.id);
                if config.ledger.policy == PersistPolicy::Eager {
                    if let Err(e) = ledger.persist().await {
                        log::error!("Ledger persist failed: {}", e);
                    }
                }
            }
            Err(e) => {
                report.failed += 1;
                log::warn!(
                    "Failed to notify {} via {}: {}. Will retry next run.",
                    post.id,
                    notifier.name(),
                    e
                );
            }
        }
    }

    // Covers Batched policy, and Eager runs whose last persist failed
    if ledger.is_dirty() {
        if let Err(e) = ledger.persist().await {
            log::error!(
                "Ledger persist failed: {}. Successful sends this run may repeat next run.",
                e
            );
        }
    }

    report.finished = Utc::now();
    report.log_summary();
    Ok(report)
}
