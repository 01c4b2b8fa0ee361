// src/services/listing.rs

//! Listing scanner service.
//!
//! Fetches gallery listing pages through a `PageSource` and merges the rows
//! into one newest-first, id-deduplicated sequence of posts. All per-page
//! and per-row failures are absorbed and surfaced as counts on the outcome,
//! never as errors that abort the scan.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, Post, RawRow, RowKind, SourceConfig};
use crate::utils::{extract_post_id, resolve_url};

/// Fetch+parse collaborator: one listing page in, raw rows out.
///
/// The scanner itself is selector-independent; everything HTML-specific
/// lives behind this trait.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch and parse one listing page (1-based).
    async fn fetch_rows(&self, page: u32) -> Result<Vec<RawRow>>;
}

/// HTTP implementation of `PageSource` using a CSS row selector.
pub struct HttpPageSource {
    client: reqwest::Client,
    base_url: String,
    row_selector: String,
    link_attr: String,
}

impl HttpPageSource {
    pub fn new(client: reqwest::Client, source: &SourceConfig) -> Self {
        Self {
            client,
            base_url: source.base_url.clone(),
            row_selector: source.row_selector.clone(),
            link_attr: source.link_attr.clone(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.base_url, sep, page)
    }

    /// Parse listing rows out of a fetched document.
    ///
    /// Rows whose link does not look like a post view link are classified
    /// as administrative (surveys, settings links and the like share the
    /// listing markup on some boards).
    fn parse_rows(&self, html: &str) -> Result<Vec<RawRow>> {
        let row_sel = Self::parse_selector(&self.row_selector)?;
        let document = Html::parse_document(html);

        let mut rows = Vec::new();
        for element in document.select(&row_sel) {
            let title: String = element.text().collect::<String>().trim().to_string();
            let href = element
                .value()
                .attr(&self.link_attr)
                .unwrap_or_default()
                .to_string();

            let kind = if href.contains("/board/view/") || extract_post_id(&href).is_some() {
                RowKind::Content
            } else {
                RowKind::Admin
            };

            rows.push(RawRow { title, href, kind });
        }
        Ok(rows)
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_rows(&self, page: u32) -> Result<Vec<RawRow>> {
        let url = self.page_url(page);
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        self.parse_rows(&html)
    }
}

/// Why a row was excluded from the scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Link carried no parseable post identifier
    MissingId,
    /// Row classified as pinned/administrative and not configured in
    NonContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "no parseable post id"),
            SkipReason::NonContent => write!(f, "pinned/administrative row"),
        }
    }
}

/// A row excluded from the scan, kept for observability.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub href: String,
    pub reason: SkipReason,
}

/// Result of one listing scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Deduplicated posts, newest-first (the listing's natural order)
    pub posts: Vec<Post>,
    /// Pages fetched and parsed successfully
    pub pages_fetched: u32,
    /// Pages skipped due to fetch/parse errors
    pub page_failures: u32,
    /// Rows dropped as later duplicates of an already-seen id
    pub duplicate_rows: usize,
    /// Rows excluded, with reasons
    pub skipped: Vec<SkippedRow>,
}

/// Scans a page window and produces a deduplicated post sequence.
pub struct ListingScanner {
    base_url: String,
    pages: u32,
    include_pinned: bool,
    request_delay: Duration,
}

impl ListingScanner {
    pub fn new(source: &SourceConfig, http: &HttpConfig) -> Self {
        Self {
            base_url: source.base_url.clone(),
            pages: source.pages.max(1),
            include_pinned: source.include_pinned,
            request_delay: Duration::from_millis(http.request_delay_ms),
        }
    }

    /// Scan pages `1..=pages` sequentially.
    ///
    /// - A page that fails to fetch is skipped; the scan continues.
    /// - Page 1 yielding zero rows short-circuits the whole scan to empty:
    ///   either the listing is empty or the selector no longer matches,
    ///   and both deserve operator attention, not a pile of page errors.
    /// - Duplicate ids across pages keep their first occurrence only.
    pub async fn scan(&self, source: &dyn PageSource) -> ScanOutcome {
        let base = Url::parse(&self.base_url).ok();
        let mut outcome = ScanOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 1..=self.pages {
            match source.fetch_rows(page).await {
                Ok(rows) => {
                    outcome.pages_fetched += 1;

                    if page == 1 && rows.is_empty() {
                        log::warn!(
                            "Page 1 of {} yielded no rows; empty listing or selector mismatch",
                            self.base_url
                        );
                        return outcome;
                    }

                    for row in rows {
                        self.collect_row(row, base.as_ref(), &mut seen, &mut outcome);
                    }
                }
                Err(e) => {
                    outcome.page_failures += 1;
                    log::warn!("Failed to fetch page {}: {}", page, e);
                }
            }

            if page < self.pages && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        outcome
    }

    fn collect_row(
        &self,
        row: RawRow,
        base: Option<&Url>,
        seen: &mut HashSet<String>,
        outcome: &mut ScanOutcome,
    ) {
        let eligible = match row.kind {
            RowKind::Content => true,
            RowKind::Pinned => self.include_pinned,
            RowKind::Admin => false,
        };
        if !eligible {
            outcome.skipped.push(SkippedRow {
                href: row.href,
                reason: SkipReason::NonContent,
            });
            return;
        }

        let Some(id) = extract_post_id(&row.href) else {
            outcome.skipped.push(SkippedRow {
                href: row.href,
                reason: SkipReason::MissingId,
            });
            return;
        };

        // First occurrence wins, including its title/link
        if !seen.insert(id.clone()) {
            outcome.duplicate_rows += 1;
            return;
        }

        let link = match base {
            Some(base) => resolve_url(base, &row.href),
            None => row.href,
        };

        outcome.posts.push(Post {
            id,
            title: row.title,
            link,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory page source: one Result<Vec<RawRow>> per page.
    struct FakeSource {
        pages: Vec<Result<Vec<RawRow>>>,
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_rows(&self, page: u32) -> Result<Vec<RawRow>> {
            match self.pages.get((page - 1) as usize) {
                Some(Ok(rows)) => Ok(rows.clone()),
                Some(Err(_)) => Err(AppError::scan(format!("page {page}"), "boom")),
                None => Ok(Vec::new()),
            }
        }
    }

    fn row(no: u32, title: &str) -> RawRow {
        RawRow {
            title: title.to_string(),
            href: format!("/board/view/?id=g&no={no}"),
            kind: RowKind::Content,
        }
    }

    fn scanner(pages: u32) -> ListingScanner {
        let source = SourceConfig {
            base_url: "https://gall.example.com/board/lists/?id=g".to_string(),
            pages,
            ..SourceConfig::default()
        };
        let http = HttpConfig {
            request_delay_ms: 0,
            ..HttpConfig::default()
        };
        ListingScanner::new(&source, &http)
    }

    #[tokio::test]
    async fn test_scan_resolves_links_and_keeps_order() {
        let source = FakeSource {
            pages: vec![Ok(vec![row(103, "P3"), row(102, "P2"), row(101, "P1")])],
        };

        let outcome = scanner(1).scan(&source).await;
        let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["103", "102", "101"]);
        assert_eq!(
            outcome.posts[0].link,
            "https://gall.example.com/board/view/?id=g&no=103"
        );
    }

    #[tokio::test]
    async fn test_cross_page_dedup_first_seen_wins() {
        let source = FakeSource {
            pages: vec![
                Ok(vec![row(103, "First Title"), row(102, "P2")]),
                // 103 got bumped onto page 2 with an edited title
                Ok(vec![row(103, "Edited Title"), row(101, "P1")]),
            ],
        };

        let outcome = scanner(2).scan(&source).await;
        assert_eq!(outcome.posts.len(), 3);
        assert_eq!(outcome.duplicate_rows, 1);
        assert_eq!(outcome.posts[0].title, "First Title");
    }

    #[tokio::test]
    async fn test_empty_page_one_short_circuits() {
        let source = FakeSource {
            pages: vec![Ok(vec![]), Ok(vec![row(101, "P1")])],
        };

        let outcome = scanner(2).scan(&source).await;
        assert!(outcome.posts.is_empty());
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped_not_fatal() {
        let source = FakeSource {
            pages: vec![
                Ok(vec![row(103, "P3")]),
                Err(AppError::scan("page 2", "network down")),
                Ok(vec![row(101, "P1")]),
            ],
        };

        let outcome = scanner(3).scan(&source).await;
        let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["103", "101"]);
        assert_eq!(outcome.page_failures, 1);
        assert_eq!(outcome.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_rows_without_id_are_counted_not_dropped_silently() {
        let source = FakeSource {
            pages: vec![Ok(vec![
                row(103, "P3"),
                RawRow {
                    title: "Broken".to_string(),
                    href: "/board/view/?id=g".to_string(),
                    kind: RowKind::Content,
                },
            ])],
        };

        let outcome = scanner(1).scan(&source).await;
        assert_eq!(outcome.posts.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::MissingId);
    }

    #[tokio::test]
    async fn test_pinned_rows_follow_config() {
        let pinned = RawRow {
            title: "Pinned".to_string(),
            href: "/board/view/?id=g&no=1".to_string(),
            kind: RowKind::Pinned,
        };
        let source = FakeSource {
            pages: vec![Ok(vec![pinned.clone(), row(101, "P1")])],
        };

        let outcome = scanner(1).scan(&source).await;
        assert_eq!(outcome.posts.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NonContent);

        let mut sc = scanner(1);
        sc.include_pinned = true;
        let source = FakeSource {
            pages: vec![Ok(vec![pinned, row(101, "P1")])],
        };
        let outcome = sc.scan(&source).await;
        assert_eq!(outcome.posts.len(), 2);
    }

    #[test]
    fn test_parse_rows_classifies_and_extracts() {
        let source = SourceConfig::default();
        let page = HttpPageSource::new(reqwest::Client::new(), &source);

        let html = r#"
            <table>
              <tr><td class="gall_tit"><a href="/board/view/?id=g&no=201">Hello</a></td></tr>
              <tr><td class="gall_tit"><a href="javascript:;">Survey banner</a></td></tr>
            </table>
        "#;

        let rows = page.parse_rows(html).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, RowKind::Content);
        assert_eq!(rows[0].title, "Hello");
        assert_eq!(rows[1].kind, RowKind::Admin);
    }

    #[test]
    fn test_page_url_appends_param() {
        let mut source = SourceConfig::default();
        source.base_url = "https://g.example.com/lists/?id=g".to_string();
        let page = HttpPageSource::new(reqwest::Client::new(), &source);
        assert_eq!(page.page_url(2), "https://g.example.com/lists/?id=g&page=2");

        source.base_url = "https://g.example.com/lists".to_string();
        let page = HttpPageSource::new(reqwest::Client::new(), &source);
        assert_eq!(page.page_url(1), "https://g.example.com/lists?page=1");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let mut source = SourceConfig::default();
        source.row_selector = "[[invalid".to_string();
        let page = HttpPageSource::new(reqwest::Client::new(), &source);
        assert!(page.parse_rows("<html></html>").is_err());
    }
}
