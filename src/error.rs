//! Error types for ln-gamma-stats

use thiserror::Error;

/// Result type alias for gamma statistics operations
pub type GammaResult<T> = Result<T, GammaError>;

/// Errors that can occur while collecting, summarizing or rendering gammas
#[derive(Debug, Error)]
pub enum GammaError {
    /// Checkpoint identifier does not resolve to any weights
    #[error("checkpoint not found: {0}")]
    NotFound(String),

    /// Hub client or download failure
    #[error("network error: {0}")]
    Network(String),

    /// Invalid safetensors payload or unsupported tensor dtype
    #[error("format error: {0}")]
    Format(String),

    /// Normalization parameter that does not follow the expected naming
    #[error("malformed parameter name '{name}': {reason}")]
    MalformedParameterName {
        /// Offending parameter name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Statistic or histogram requested over zero values
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// NaN or infinite value where only finite values are allowed
    #[error("non-finite input: {0}")]
    NonFinite(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Histogram rendering error
    #[error("render error: {0}")]
    Render(String),
}

impl GammaError {
    /// Build a [`GammaError::MalformedParameterName`]
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedParameterName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
