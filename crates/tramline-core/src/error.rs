//! Router error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("No dispatcher available to execute the navigation")]
    MissingDispatcher,

    #[error("Route not found: {0}")]
    UnresolvedRoute(String),

    #[error("Link has neither href nor route name")]
    MissingHref,

    #[error("Router already mounted")]
    AlreadyMounted,

    #[error("Router not mounted")]
    NotMounted,

    #[error("History error: {0}")]
    History(#[from] tramline_history::HistoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
