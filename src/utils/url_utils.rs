//! URL normalization and resolution utilities.
//!
//! Every URL the crawlers request passes through [`normalize_url`] first, so
//! hand-typed targets and `src`/`href` attributes containing spaces or
//! non-ASCII characters (a U+2011 hyphen in a path, for instance) are safe to
//! put on the wire and safe to resolve against a base.

use anyhow::{Context, Result};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

/// Bytes that are not legal in a URL as written.
///
/// Everything outside this set (alphanumerics, the unreserved and reserved
/// punctuation, and `%`) passes through; non-ASCII bytes are always encoded.
/// Leaving `%` out is what keeps existing escapes intact.
const ILLEGAL_IN_URL: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode every character that is not legal in a URL.
///
/// Existing `%XX` escapes are left exactly as they are, so the function is
/// idempotent: `normalize_url(&normalize_url(u)) == normalize_url(u)`.
///
/// Input containing a malformed escape (a `%` not followed by two hex
/// digits) is returned unchanged; the request made with it fails later and is
/// reported there.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    if has_malformed_escape(url.as_bytes()) {
        tracing::debug!("Leaving URL with malformed percent escape untouched: {url}");
        return url.to_string();
    }

    utf8_percent_encode(url, ILLEGAL_IN_URL).to_string()
}

fn has_malformed_escape(bytes: &[u8]) -> bool {
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    })
}

/// Resolve a possibly relative reference against `base_url` and normalize
/// the result.
pub fn resolve_url(base_url: &str, reference: &str) -> Result<String> {
    let base = Url::parse(&normalize_url(base_url)).context("Invalid base URL")?;
    let resolved = base
        .join(&normalize_url(reference.trim()))
        .with_context(|| format!("Failed to resolve '{reference}' against {base_url}"))?;
    Ok(normalize_url(resolved.as_str()))
}

/// Check whether a URL can be fetched by the HTTP client
///
/// `data:`, `javascript:` and `blob:` references parse fine but have nothing
/// to download.
#[must_use]
pub fn is_fetchable_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_ascii_hyphen_is_encoded() {
        let url = "http://itsecgames.com/bug\u{2011}list.php";
        let normalized = normalize_url(url);
        assert_eq!(normalized, "http://itsecgames.com/bug%E2%80%91list.php");
        assert_eq!(normalize_url(&normalized), normalized);
    }

    #[test]
    fn test_existing_escapes_untouched() {
        let url = "https://example.com/a%20b?q=%41%2F";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn test_spaces_and_quotes_encoded() {
        assert_eq!(
            normalize_url("https://example.com/my file\".js"),
            "https://example.com/my%20file%22.js"
        );
    }

    #[test]
    fn test_reserved_punctuation_kept() {
        let url = "https://user@example.com:8080/a;b/c?x=[1]&y=$'(*)'+,!#frag~_.-";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn test_control_and_unsafe_ascii_encoded() {
        assert_eq!(
            normalize_url("https://example.com/a\tb<{|}>^`\\"),
            "https://example.com/a%09b%3C%7B%7C%7D%3E%5E%60%5C"
        );
    }

    #[test]
    fn test_malformed_escape_passes_through() {
        let url = "https://example.com/100%zz\u{e9}";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn test_trailing_percent_is_malformed() {
        assert_eq!(normalize_url("https://example.com/%"), "https://example.com/%");
        assert_eq!(normalize_url("https://example.com/%4"), "https://example.com/%4");
    }

    #[test]
    fn test_resolve_relative() {
        let resolved = resolve_url("https://example.com/app/index.html", "../static/app.js").unwrap();
        assert_eq!(resolved, "https://example.com/static/app.js");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let resolved = resolve_url("https://example.com/", "//cdn.example.net/lib.js").unwrap();
        assert_eq!(resolved, "https://cdn.example.net/lib.js");
    }

    #[test]
    fn test_resolve_non_ascii_reference() {
        let resolved = resolve_url("https://example.com/", "css/th\u{e8}me.css").unwrap();
        assert_eq!(resolved, "https://example.com/css/th%C3%A8me.css");
    }

    #[test]
    fn test_is_fetchable_url() {
        assert!(is_fetchable_url("https://example.com/app.js"));
        assert!(!is_fetchable_url("data:text/javascript,alert(1)"));
        assert!(!is_fetchable_url("javascript:void(0)"));
        assert!(!is_fetchable_url(""));
    }
}
