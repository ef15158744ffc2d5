// media-providers/src/canonicalize.rs
// ============================================================================
// Module: URL Canonicalization
// Description: Strips fragment/query, normalizes trailing slash.
// Purpose: Shared dedupe key computation (§4.2, §8 invariant 6).
// Dependencies: url
// ============================================================================

use url::Url;

/// Strips the fragment and query, removes a trailing slash unless the path is
/// root, and preserves scheme/host/path. Idempotent: canonicalizing an
/// already-canonical URL is a no-op.
///
/// # Errors
/// Returns the url crate's parse error when `raw` is not a valid URL.
pub fn canonicalize_url(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;
    url.set_fragment(None);
    url.set_query(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    Ok(url.to_string())
}

/// Dedupes `urls` by their canonical form, preserving first-seen order.
/// Entries that fail to canonicalize are dropped.
#[must_use]
pub fn dedupe_by_canonical_url(urls: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for raw in urls {
        let Ok(canonical) = canonicalize_url(raw) else {
            continue;
        };
        if seen.insert(canonical.clone()) {
            out.push(canonical);
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::canonicalize_url;
    use super::dedupe_by_canonical_url;

    #[test]
    fn strips_fragment_and_query() {
        let canonical = canonicalize_url("https://example.com/a/b?x=1#frag").unwrap();
        assert_eq!(canonical, "https://example.com/a/b");
    }

    #[test]
    fn strips_trailing_slash_unless_root() {
        assert_eq!(canonicalize_url("https://example.com/a/").unwrap(), "https://example.com/a");
        assert_eq!(canonicalize_url("https://example.com/").unwrap(), "https://example.com/");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = canonicalize_url("https://example.com/a/b?x=1#frag").unwrap();
        let twice = canonicalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn dedupe_preserves_first_seen_order_across_fragment_variants() {
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
            "https://example.com/a#x".to_string(),
        ];
        let deduped = dedupe_by_canonical_url(&urls);
        assert_eq!(
            deduped,
            vec!["https://example.com/a".to_string(), "https://example.com/b".to_string()]
        );
    }
}
