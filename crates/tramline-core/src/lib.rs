//! Tramline Core
//!
//! Navigation orchestration for single-page applications. The `Router`
//! binds a route store to browser history; `NavLink` turns link clicks
//! into navigation intents.

mod config;
mod error;
mod intent;
mod link;
mod router;
mod store;

pub use config::{RouterConfig, ScrollRestoreOrder};
pub use error::RouterError;
pub use intent::{NavigationIntent, NavigationType, Route};
pub use link::{ClickEvent, ClickOutcome, NavLink};
pub use router::{default_history_factory, HistoryFactory, Router};
pub use store::{ChangeListener, Dispatcher, RouteRenderer, RouteStore, StaticRouteStore};

// Re-export the layers the router is built on
pub use tramline_history::{
    EventKind, FnTransformer, HashRouteTransformer, History, HistoryCall, HistoryError,
    HistoryMode, HistoryOptions, ListenerId, Location, MemoryWindow, ScrollPosition,
    UseHashRoute, Window, WindowEvent,
};
pub use tramline_url::{parse_url, parse_url_path, ParsedUrl};

pub type Result<T> = std::result::Result<T, RouterError>;

/// Initialize logging
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
