//! Post data structures.

use serde::{Deserialize, Serialize};

/// A post extracted from a gallery listing page.
///
/// The `id` is the sole identity key: two posts with the same id are the
/// same post even if the title was edited between scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Stable identifier extracted from the post link
    pub id: String,

    /// Post title as displayed on the listing
    pub title: String,

    /// Full URL to the post
    pub link: String,
}

impl Post {
    /// Render the post for delivery using a template.
    ///
    /// Supported placeholders: `{id}`, `{title}`, `{link}`.
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{id}", &self.id)
            .replace("{title}", &self.title)
            .replace("{link}", &self.link)
    }
}

/// Classification of a listing row, assigned by the page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    /// Ordinary post row
    #[default]
    Content,
    /// Pinned/highlighted post
    Pinned,
    /// Administrative row (announcements, settings, ads)
    Admin,
}

/// A raw listing row as yielded by the fetch+parse collaborator.
///
/// Carries the display title, the (possibly relative) link and an explicit
/// classification so the pinned/admin exclusion policy lives in one predicate
/// instead of being duplicated per source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub title: String,
    pub href: String,
    pub kind: RowKind,
}
