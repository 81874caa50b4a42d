//! Error types for innsight-core

use thiserror::Error;

/// Main error type for the innsight-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Series has too few valid observations to forecast
    #[error("insufficient data: need at least {needed} valid points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Unsupported forecasting strategy tag
    #[error("unknown forecast method: {0}")]
    UnknownMethod(String),

    /// History provider failure or timeout
    #[error("upstream fetch error: {0}")]
    Upstream(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for innsight-core
pub type Result<T> = std::result::Result<T, Error>;
