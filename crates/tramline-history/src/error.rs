//! History error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Unsupported by this window: {0}")]
    Unsupported(&'static str),

    #[error("Native history call failed: {0}")]
    Native(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
