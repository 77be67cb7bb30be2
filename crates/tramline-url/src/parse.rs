//! Full URL parser

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::normalize_pathname;

/// `search` value when the URL has no query string
pub const EMPTY_SEARCH: &str = "?";
/// `hash` value when the URL has no fragment
pub const EMPTY_HASH: &str = "#";

// origin, path, query, fragment. Whitespace ends the URL.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+://[^/\s?#]+)?(/?[^?#\s]*)(\??[^?#\s]*)(#?\S*)")
        .expect("URL pattern is valid")
});

/// Normalized pieces of a URL.
///
/// `search` and `hash` are never empty: an absent query is `"?"` and an absent
/// fragment is `"#"`. `path` is `pathname` followed by the query when one is
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedUrl {
    /// Pathname plus query string
    pub path: String,
    /// Normalized pathname, always starting with `/`
    pub pathname: String,
    /// Query string including the leading `?`
    pub search: String,
    /// Fragment including the leading `#`
    pub hash: String,
}

impl ParsedUrl {
    /// Parse a URL that is known to be present.
    pub fn parse(url: &str) -> Self {
        parse(url)
    }

    /// Whether the URL carried a non-empty query string.
    pub fn has_search(&self) -> bool {
        self.search != EMPTY_SEARCH
    }

    /// Whether the URL carried a non-empty fragment.
    pub fn has_hash(&self) -> bool {
        self.hash != EMPTY_HASH
    }

    /// Query string with the leading `?`, or `""` when there is none.
    pub fn search_or_empty(&self) -> &str {
        if self.has_search() {
            &self.search
        } else {
            ""
        }
    }

    /// Fragment without the leading `#`.
    pub fn fragment(&self) -> &str {
        self.hash.strip_prefix('#').unwrap_or(&self.hash)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

impl FromStr for ParsedUrl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

/// Parse a URL into its normalized pieces.
///
/// Returns `None` when no URL is given.
///
/// ```
/// use tramline_url::parse_url;
///
/// let parsed = parse_url("http://somedomain.com:3000/path/to/page/?a=1&b=2#frag").unwrap();
/// assert_eq!(parsed.pathname, "/path/to/page");
/// assert_eq!(parsed.path, "/path/to/page?a=1&b=2");
/// assert_eq!(parsed.search, "?a=1&b=2");
/// assert_eq!(parsed.hash, "#frag");
/// ```
pub fn parse_url<'a>(url: impl Into<Option<&'a str>>) -> Option<ParsedUrl> {
    url.into().map(parse)
}

fn parse(url: &str) -> ParsedUrl {
    // Every group is optional, so the pattern matches any input
    let captures = URL_PATTERN.captures(url);
    let group = |i: usize| {
        captures
            .as_ref()
            .and_then(|c| c.get(i))
            .map_or("", |m| m.as_str())
    };

    let pathname = normalize_pathname(group(2));
    let search = match group(3) {
        "" | EMPTY_SEARCH => EMPTY_SEARCH.to_string(),
        s => s.to_string(),
    };
    let hash = match group(4) {
        "" => EMPTY_HASH.to_string(),
        h => h.to_string(),
    };

    let path = if search == EMPTY_SEARCH {
        pathname.clone()
    } else {
        format!("{}{}", pathname, search)
    };

    ParsedUrl {
        path,
        pathname,
        search,
        hash,
    }
}
