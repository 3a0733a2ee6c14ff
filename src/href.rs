//! Href handling: splitting into `(url, pointer)`, JSON Pointer tokens and
//! URL joining.

use serde_json::Value;
use url::Url;

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Split an href on the first `#` into its document URL and JSON Pointer.
///
/// A missing fragment and an empty fragment both yield an empty pointer.
pub fn split_href(href: &str) -> (&str, &str) {
    match href.find('#') {
        Some(idx) => (&href[..idx], &href[idx + 1..]),
        None => (href, ""),
    }
}

/// Build the canonical `url#pointer` form.
pub fn join_href(url: &str, pointer: &str) -> String {
    format!("{}#{}", url, pointer)
}

/// Escape a mapping key for use as a JSON Pointer token (`~` -> `~0`, `/` -> `~1`).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append tokens to a pointer, escaping each one.
pub fn child_pointer<'a>(pointer: &str, tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = pointer.to_string();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_token(token));
    }
    out
}

/// Navigate a JSON Pointer (RFC 6901) within a document.
///
/// Each token addresses a mapping key or a sequence index; `~1` and `~0`
/// are unescaped. The empty pointer addresses the whole document.
pub fn navigate<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    document.pointer(pointer)
}

/// Mutable counterpart of [`navigate`].
pub fn navigate_mut<'a>(document: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    document.pointer_mut(pointer)
}

/// Canonical form of a document URL, so `http://a.com` and `http://a.com/`
/// name the same document. Non-URLs are returned unchanged.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}

/// Resolve `reference` against `base`.
///
/// When `base` is an absolute URL the reference is joined per RFC 3986;
/// otherwise (tests, relative documents) the reference is used verbatim.
pub fn resolve_url(base: &str, reference: &str) -> String {
    match Url::parse(base) {
        Ok(base) => match base.join(reference) {
            Ok(joined) => joined.to_string(),
            Err(_) => reference.to_string(),
        },
        Err(_) => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_url_schemes() {
        assert!(is_url("https://example.com/schema.json"));
        assert!(is_url("http://example.com/schema.json"));
        assert!(!is_url("/schema"));
        assert!(!is_url("url.com"));
    }

    #[test]
    fn split_with_pointer() {
        assert_eq!(
            split_href("http://a.com/s#/properties/name"),
            ("http://a.com/s", "/properties/name")
        );
    }

    #[test]
    fn split_without_fragment() {
        assert_eq!(split_href("http://a.com/s"), ("http://a.com/s", ""));
        assert_eq!(split_href("http://a.com/s#"), ("http://a.com/s", ""));
    }

    #[test]
    fn split_local_reference() {
        assert_eq!(split_href("#/pointer"), ("", "/pointer"));
        assert_eq!(split_href("#"), ("", ""));
    }

    #[test]
    fn split_only_on_first_hash() {
        assert_eq!(split_href("/s#/a#b"), ("/s", "/a#b"));
    }

    #[test]
    fn escapes_tokens() {
        assert_eq!(escape_token("a/b~c"), "a~1b~0c");
        assert_eq!(child_pointer("", ["properties", "a/b"]), "/properties/a~1b");
    }

    #[test]
    fn navigates_keys_and_indices() {
        let doc = json!({"a": [{"b/c": 1}, {"d~e": 2}]});
        assert_eq!(navigate(&doc, "/a/0/b~1c"), Some(&json!(1)));
        assert_eq!(navigate(&doc, "/a/1/d~0e"), Some(&json!(2)));
        assert_eq!(navigate(&doc, ""), Some(&doc));
        assert_eq!(navigate(&doc, "/missing"), None);
        assert_eq!(navigate(&doc, "/a/7"), None);
    }

    #[test]
    fn resolves_relative_urls() {
        assert_eq!(
            resolve_url("http://a.com/api/items", "/root/1"),
            "http://a.com/root/1"
        );
        assert_eq!(
            resolve_url("http://a.com/schemas/root.json", "other.json"),
            "http://a.com/schemas/other.json"
        );
        assert_eq!(
            resolve_url("http://a.com/x", "http://b.com/y"),
            "http://b.com/y"
        );
        assert_eq!(resolve_url("/", "/root"), "/root");
    }

    #[test]
    fn normalizes_document_urls() {
        assert_eq!(normalize_url("http://a.com"), "http://a.com/");
        assert_eq!(normalize_url("HTTP://A.com/s"), "http://a.com/s");
        assert_eq!(normalize_url("url.com"), "url.com");
        assert_eq!(normalize_url(""), "");
    }
}
