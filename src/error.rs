//! Error types for the fincast crate

use thiserror::Error;

/// Custom error types for the fincast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Too few eligible historical observations for a baseline or
    /// volatility estimate
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Contradictory or out-of-range inputs (non-uniform horizon,
    /// confidence level outside 50-95%, malformed annotation ranges)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Internal invariant violation: confidence bounds crossing the
    /// projected value. Indicates a defect in the projection math and is
    /// never downgraded to a warning.
    #[error("Interval integrity violation: {0}")]
    IntervalIntegrity(String),

    /// Error serializing results for the report layer
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
