//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed user input (weights, set numbers, bulk edits)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog session, workout, or exercise that should exist does not
    #[error("Not found: {0}")]
    NotFound(String),

    /// Log store unavailable or a statement failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Workout transition attempted from the wrong state
    #[error("State error: {0}")]
    State(String),

    /// Caller is not an authenticated user
    #[error("Identity error: {0}")]
    Identity(String),

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

    /// Program catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}
