//! Tramline URL parsing
//!
//! Decomposes URL strings into the normalized pieces the router works with:
//! - `parse_url` → `ParsedUrl { path, pathname, search, hash }`
//! - `parse_url_path` → the normalized pathname alone
//!
//! Both accept absolute (`scheme://host/...`) and relative URLs. `file:` URLs
//! are not supported.

mod parse;
mod path;

pub use parse::{parse_url, ParsedUrl, EMPTY_HASH, EMPTY_SEARCH};
pub use path::parse_url_path;

/// Strip trailing slashes and make sure the path starts with one.
pub(crate) fn normalize_pathname(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
