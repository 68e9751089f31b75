//! Error types for pylight

use thiserror::Error;

/// Result type alias for pylight operations
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Highlighting error types
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pattern in rule '{name}'")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("theme error: {0}")]
    Theme(String),
}
