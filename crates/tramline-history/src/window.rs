//! Browser environment seam
//!
//! `History` never touches a global window. Everything it needs from the
//! host goes through the `Window` trait, so the same code runs against a
//! real browser (`tramline-web`) or a `MemoryWindow`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::Result;

/// Callback for window events
pub type Listener = Rc<dyn Fn(&WindowEvent)>;

/// Deferred callback for `Window::set_timeout`
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle for a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Native history navigation (back/forward)
    PopState,
    /// URL fragment changed
    HashChange,
    /// Document scrolled
    Scroll,
}

impl EventKind {
    /// DOM event type name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PopState => "popstate",
            EventKind::HashChange => "hashchange",
            EventKind::Scroll => "scroll",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
    pub kind: EventKind,
    /// State of the entry navigated to (popstate only)
    pub state: Option<Value>,
}

impl WindowEvent {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, state: None }
    }

    pub fn with_state(kind: EventKind, state: Option<Value>) -> Self {
        Self { kind, state }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Snapshot of `window.location`.
///
/// Fields follow the DOM: `protocol` keeps its trailing `:`, `search` and
/// `hash` are empty strings when absent and carry their `?`/`#` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub protocol: String,
    pub host: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Location {
    /// `protocol//host`
    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol, self.host)
    }

    /// `pathname + search`
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }

    /// Full URL
    pub fn href(&self) -> String {
        format!("{}{}{}", self.origin(), self.path_and_query(), self.hash)
    }
}

/// The host navigation environment.
pub trait Window {
    /// Whether `history.pushState` is available
    fn has_push_state(&self) -> bool;

    fn location(&self) -> Location;

    /// `history.state` of the current entry
    fn history_state(&self) -> Option<Value>;

    /// `history.pushState(state, title, url)`
    fn push_state(&self, state: Option<&Value>, title: Option<&str>, url: &str) -> Result<()>;

    /// `history.replaceState(state, title, url)`; `None` keeps the current URL
    fn replace_state(
        &self,
        state: Option<&Value>,
        title: Option<&str>,
        url: Option<&str>,
    ) -> Result<()>;

    /// `location.href = url`
    fn assign(&self, url: &str) -> Result<()>;

    /// `location.replace(url)`
    fn replace_location(&self, url: &str) -> Result<()>;

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId);

    fn scroll_position(&self) -> ScrollPosition;

    fn scroll_to(&self, x: f64, y: f64);

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    fn clear_timeout(&self, id: TimerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parts() {
        let location = Location {
            protocol: "http:".to_string(),
            host: "mydomain.com:8080".to_string(),
            pathname: "/path".to_string(),
            search: "?a=1".to_string(),
            hash: "#/route".to_string(),
        };
        assert_eq!(location.origin(), "http://mydomain.com:8080");
        assert_eq!(location.path_and_query(), "/path?a=1");
        assert_eq!(location.href(), "http://mydomain.com:8080/path?a=1#/route");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::PopState.to_string(), "popstate");
        assert_eq!(EventKind::HashChange.as_str(), "hashchange");
        assert_eq!(
            serde_json::to_string(&EventKind::Scroll).unwrap(),
            "\"scroll\""
        );
    }
}
