// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative href against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract a stable post identifier from a listing link.
///
/// Gallery links carry the post number in the query string (`?no=123`);
/// other board software uses similar keys, so a few common ones are
/// accepted, with `no` first.
pub fn extract_post_id(href: &str) -> Option<String> {
    let patterns = [
        regex::Regex::new(r"[?&](?:no|id|seq|idx|article_no|articleNo)=(\d+)").ok()?,
        regex::Regex::new(r"/(?:view|post|article)/(\d+)").ok()?,
    ];

    for pattern in &patterns {
        if let Some(caps) = pattern.captures(href) {
            if let Some(id) = caps.get(1) {
                return Some(id.as_str().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://gall.example.com/board/lists/?id=g").unwrap();
        assert_eq!(
            resolve_url(&base, "/board/view/?id=g&no=123"),
            "https://gall.example.com/board/view/?id=g&no=123"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_extract_post_id_no_param() {
        assert_eq!(
            extract_post_id("/board/view/?id=comic_new6&no=12345&page=1"),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_extract_post_id_prefers_no_over_id() {
        // `id` names the gallery here, not the post; non-numeric so only
        // `no` can match
        assert_eq!(
            extract_post_id("https://example.com/view?id=gallery&no=77"),
            Some("77".to_string())
        );
    }

    #[test]
    fn test_extract_post_id_path_form() {
        assert_eq!(
            extract_post_id("https://example.com/post/456"),
            Some("456".to_string())
        );
    }

    #[test]
    fn test_extract_post_id_missing() {
        assert_eq!(extract_post_id("/board/lists/?id=gallery"), None);
        assert_eq!(extract_post_id("javascript:void(0)"), None);
    }
}
