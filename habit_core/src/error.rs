//! Error types for the habit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for habit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed habit input (name, frequency)
    #[error("{0}")]
    Validation(String),

    /// Referenced habit does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Stored tables violate an integrity constraint
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl Error {
    /// Returns true for [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true for [`Error::Validation`]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
