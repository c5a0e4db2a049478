//! Error types for the ronda workspace.

use thiserror::Error;

/// The main error type for ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Malformed input: mismatched shapes, non-monotonic dates, duplicate
    /// instruments. Always fail-fast, never coerced.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required OHLCV field or panel column is missing.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A factor computation failed outright (as opposed to producing
    /// absent cells, which is not an error).
    #[error("Factor computation failed: {0}")]
    FactorComputation(String),

    /// A factor name was requested that the registry does not know.
    #[error("Unknown factor: {0}")]
    UnknownFactor(String),

    /// A fusion strategy failed outright.
    #[error("Fusion failed: {0}")]
    Fusion(String),

    /// Configuration value outside its valid domain.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
