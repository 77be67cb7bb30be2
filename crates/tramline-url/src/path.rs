//! Path-only parser

use regex::Regex;
use std::sync::LazyLock;

use crate::normalize_pathname;

static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z]+://[^/\s]+)?(/?[^?#\s]*)").expect("path pattern is valid")
});

/// Parse the normalized pathname out of a URL, dropping query and fragment.
///
/// `"http://foo.com"` gives `"/"` and `"http://foo.com/abc/"` gives `"/abc"`.
pub fn parse_url_path<'a>(url: impl Into<Option<&'a str>>) -> Option<String> {
    let url = url.into()?;
    let raw = PATH_PATTERN
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str());
    Some(normalize_pathname(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_urls() {
        let missing: Option<&str> = None;
        assert_eq!(parse_url_path(missing), None);
    }

    #[test]
    fn test_absolute_urls() {
        let cases = [
            ("http://something.example.com", "/"),
            ("http://something.example.com/", "/"),
            ("http://something.example.com/?bar=baz", "/"),
            ("http://something.example.com#hashfrag", "/"),
            ("http://something.example.com/foo", "/foo"),
            ("http://something.example.com/foo/bar/", "/foo/bar"),
            ("https://something.example.com/foo/bar#hashfrag", "/foo/bar"),
            ("https://something.example.com/foo/bar/?bar=baz&a=b", "/foo/bar"),
            ("https://something.example.com/foo/bar/baz?bar=baz&a=b#hashfrag", "/foo/bar/baz"),
        ];
        for (url, expected) in cases {
            assert_eq!(parse_url_path(url).as_deref(), Some(expected), "{}", url);
        }
    }

    #[test]
    fn test_relative_urls() {
        assert_eq!(parse_url_path("/").as_deref(), Some("/"));
        assert_eq!(parse_url_path("/foo/bar/").as_deref(), Some("/foo/bar"));
        assert_eq!(parse_url_path("/foo/bar#hashfrag").as_deref(), Some("/foo/bar"));
        assert_eq!(parse_url_path("/foo?bar=baz").as_deref(), Some("/foo"));
        assert_eq!(parse_url_path("foo").as_deref(), Some("/foo"));
    }

    #[test]
    fn test_agrees_with_full_parser() {
        for url in ["/a/b/?x=1#y", "https://h.com/a/", "rel/path", "#only"] {
            let full = crate::parse_url(url).map(|p| p.pathname);
            assert_eq!(parse_url_path(url), full, "{}", url);
        }
    }
}
