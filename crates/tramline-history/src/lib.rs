//! Tramline History
//!
//! One interface over three browser capability tiers:
//! - `Native`: the history API (`pushState`/`replaceState`, `popstate`)
//! - `HashEmulated`: routes carried in the URL fragment (`hashchange`)
//! - `FullReload`: every navigation is a page load
//!
//! The tier is chosen once when a `History` is built and never changes.
//! The browser environment is injected through the `Window` trait;
//! `MemoryWindow` is an in-memory implementation for tests and simulation.

mod error;
mod history;
mod memory;
mod mode;
mod options;
mod window;

pub use error::HistoryError;
pub use history::History;
pub use memory::{HistoryCall, MemoryWindow};
pub use mode::HistoryMode;
pub use options::{FnTransformer, HashRouteTransformer, HistoryOptions, UseHashRoute};
pub use window::{
    EventKind, Listener, ListenerId, Location, ScrollPosition, TimerCallback, TimerId, Window,
    WindowEvent,
};

pub type Result<T> = std::result::Result<T, HistoryError>;
