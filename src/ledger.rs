// src/ledger.rs

//! Durable ledger of already-notified post identifiers.
//!
//! The ledger is the idempotency layer: a post id enters it only after a
//! notification attempt reported success, and once present it is never
//! removed (short of manual intervention on the file). Runs are stateless,
//! so the file is the only memory shared between them.
//!
//! On-disk format is one id per line, UTF-8. A missing, unreadable or
//! malformed file is treated as an empty history, never as a fatal error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Post;

/// When the ledger is written back to disk during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistPolicy {
    /// Persist after every successful notification. Survives a crash
    /// mid-batch; costs one write per send.
    #[default]
    Eager,
    /// Persist once at the end of the run. A crash after some sends and
    /// before the final persist re-sends those posts next run.
    Batched,
}

/// In-memory ledger bound to a file path.
#[derive(Debug)]
pub struct NotifiedLedger {
    path: PathBuf,
    ids: HashSet<String>,
    dirty: bool,
}

impl NotifiedLedger {
    /// Load the ledger from disk.
    ///
    /// Absent or unreadable files yield an empty ledger; a run must never
    /// fail because no history exists yet.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No ledger at {}, starting fresh", path.display());
                HashSet::new()
            }
            Err(e) => {
                log::warn!(
                    "Failed to read ledger {}: {}. Starting fresh.",
                    path.display(),
                    e
                );
                HashSet::new()
            }
        };

        Self {
            path,
            ids,
            dirty: false,
        }
    }

    /// Number of ids in the ledger.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the ledger holds no ids.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether an id has already been notified.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Whether in-memory state has diverged from the last persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep only posts whose id is not yet in the ledger, preserving order.
    pub fn filter_new(&self, posts: &[Post]) -> Vec<Post> {
        posts
            .iter()
            .filter(|p| !self.ids.contains(&p.id))
            .cloned()
            .collect()
    }

    /// Record an id as notified in memory. Does not persist.
    ///
    /// Returns false if the id was already present.
    pub fn mark_notified(&mut self, id: &str) -> bool {
        let inserted = self.ids.insert(id.to_string());
        if inserted {
            self.dirty = true;
        }
        inserted
    }

    /// Write the full id set to disk, replacing prior content.
    ///
    /// Writes to a temp file and renames so a crash mid-write cannot leave
    /// a truncated ledger. Safe to call any number of times; the file always
    /// reflects the in-memory set as of the last call.
    pub async fn persist(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut lines: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        lines.sort_unstable();
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            title: format!("Post {id}"),
            link: format!("https://example.com/view/?no={id}"),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = NotifiedLedger::load(tmp.path().join("nope.txt")).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notified.txt");

        let mut ledger = NotifiedLedger::load(&path).await;
        assert!(ledger.mark_notified("100"));
        assert!(ledger.mark_notified("101"));
        ledger.persist().await.unwrap();

        let reloaded = NotifiedLedger::load(&path).await;
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("100"));
        assert!(reloaded.contains("101"));
        assert!(!reloaded.contains("102"));
    }

    #[tokio::test]
    async fn test_load_skips_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notified.txt");
        tokio::fs::write(&path, "100\n\n  \n101\n").await.unwrap();

        let ledger = NotifiedLedger::load(&path).await;
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_persist_overwrites_fully() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notified.txt");
        tokio::fs::write(&path, "stale-id\n").await.unwrap();

        let mut ledger = NotifiedLedger::load(&path).await;
        ledger.mark_notified("200");
        ledger.persist().await.unwrap();

        // Second persist with no changes keeps the same content
        ledger.persist().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "200\nstale-id\n");
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = NotifiedLedger::load(tmp.path().join("notified.txt")).await;

        assert!(ledger.mark_notified("100"));
        assert!(!ledger.mark_notified("100"));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_new_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = NotifiedLedger::load(tmp.path().join("notified.txt")).await;
        ledger.mark_notified("102");

        let posts = vec![post("103"), post("102"), post("101")];
        let fresh = ledger.filter_new(&posts);
        let ids: Vec<&str> = fresh.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["103", "101"]);
    }

    #[tokio::test]
    async fn test_persist_creates_parent_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".cache/notified.txt");

        let mut ledger = NotifiedLedger::load(&path).await;
        ledger.mark_notified("1");
        ledger.persist().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_dirty_tracking() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = NotifiedLedger::load(tmp.path().join("n.txt")).await;
        assert!(!ledger.is_dirty());

        ledger.mark_notified("1");
        assert!(ledger.is_dirty());

        ledger.persist().await.unwrap();
        assert!(!ledger.is_dirty());
    }
}
