//! Router configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// When scroll work happens relative to rendering the new route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollRestoreOrder {
    BeforeRender,
    #[default]
    AfterRender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Dispatch a `pageload` navigation at mount when the URL and the store disagree
    pub check_route_on_page_load: bool,
    /// Save and restore scroll offsets in history entries
    pub enable_scroll: bool,
    /// Quiet period before a scroll position is saved
    pub scroll_debounce_ms: u64,
    pub scroll_restore: ScrollRestoreOrder,
    /// `None` picks hash routing only when `pushState` is missing
    pub use_hash_route: Option<bool>,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            check_route_on_page_load: false,
            enable_scroll: true,
            scroll_debounce_ms: 150,
            scroll_restore: ScrollRestoreOrder::AfterRender,
            use_hash_route: None,
        }
    }
}
