//! Error types for the callshield library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the callshield library.
///
/// A lookup miss, an unblock of a never-blocked number, or a malformed phone
/// number are NOT errors: they surface as `None`, a no-op, or a pass-through
/// value. This enum covers the fatal paths, storage failures first among them.
#[derive(Error, Debug)]
pub enum CallShieldError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure creating the settings singleton or seed data at startup
    #[error("Initialization failed: {0}")]
    Init(String),

    /// Rejected user input (names, reasons, thresholds)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with CallShieldError
pub type Result<T> = std::result::Result<T, CallShieldError>;

impl From<anyhow::Error> for CallShieldError {
    fn from(err: anyhow::Error) -> Self {
        CallShieldError::Other(err.to_string())
    }
}
