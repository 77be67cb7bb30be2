//! Capability tiers
//!
//! ```text
//! pushState  hash routing   mode
//! ---------  ------------   ---------------------------------
//! yes        no             Native
//! any        yes            HashEmulated { native_writes }
//! no         no             FullReload
//! ```
//!
//! Picked once per `History`; there are no transitions.

use serde::{Deserialize, Serialize};

use crate::window::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// History API used as-is
    Native,
    /// Route kept in the URL fragment. With `native_writes` the fragment URL
    /// is written through the history API, otherwise through `location`.
    HashEmulated { native_writes: bool },
    /// No client-side history; navigation loads the page
    FullReload,
}

impl HistoryMode {
    pub fn select(has_push_state: bool, use_hash_route: bool) -> Self {
        match (has_push_state, use_hash_route) {
            (_, true) => HistoryMode::HashEmulated {
                native_writes: has_push_state,
            },
            (true, false) => HistoryMode::Native,
            (false, false) => HistoryMode::FullReload,
        }
    }

    pub fn has_push_state(&self) -> bool {
        matches!(
            self,
            HistoryMode::Native
                | HistoryMode::HashEmulated {
                    native_writes: true
                }
        )
    }

    pub fn uses_hash(&self) -> bool {
        matches!(self, HistoryMode::HashEmulated { .. })
    }

    /// Event that signals a navigation in this mode
    pub fn change_event(&self) -> EventKind {
        if self.has_push_state() {
            EventKind::PopState
        } else {
            EventKind::HashChange
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryMode::Native => "native",
            HistoryMode::HashEmulated { .. } => "hash_emulated",
            HistoryMode::FullReload => "full_reload",
        }
    }
}

impl std::fmt::Display for HistoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
