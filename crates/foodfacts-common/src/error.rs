//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommonError {
    pub fn invalid_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}
