//! Core error types for smilekeeper-core.
//!
//! All fallible operations in the library report through these enums,
//! built on thiserror so callers get structured, matchable errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smilekeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Actuator transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Actuator-transport-specific errors.
///
/// Transport failures are non-fatal by design: the controller treats a
/// failed write as "no pulse issued" and retries at the next eligible
/// window.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport is not connected to a device.
    #[error("Transport not connected")]
    NotConnected,

    /// Writing the command bytes failed.
    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The device node could not be opened.
    #[error("Failed to open device {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
