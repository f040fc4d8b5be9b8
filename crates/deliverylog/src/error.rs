//! Error types for deliverylog.
//!
//! This module defines all error types used throughout the deliverylog crate.
//! Invalid delivery slots are not errors: they are reported as
//! [`RejectReason`](crate::builder::RejectReason)s on a batch outcome.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for deliverylog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Delivery Log Errors ===
    /// The delivery log could not be read.
    #[error("failed to read delivery log at {path}: {source}")]
    LogRead {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// The delivery log could not be written.
    #[error("failed to write delivery log at {path}: {source}")]
    LogWrite {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// An export could not be written.
    #[error("failed to write export: {0}")]
    Export(#[source] csv::Error),

    // === Session Errors ===
    /// The session file could not be read.
    #[error("failed to read sessions at {path}: {source}")]
    SessionRead {
        /// Path to the session file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The session file could not be written.
    #[error("failed to write sessions at {path}: {source}")]
    SessionWrite {
        /// Path to the session file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Registration Errors ===
    /// Every slot in a submission was rejected.
    #[error("nothing valid to register")]
    EmptyBatch,

    /// A slot index outside the configured range was used.
    #[error("slot {slot} is out of range (slots are 1..={max})")]
    SlotOutOfRange {
        /// The offending slot.
        slot: usize,
        /// Highest valid slot.
        max: usize,
    },

    /// The same slot was submitted more than once.
    #[error("slot {slot} appears more than once")]
    DuplicateSlot {
        /// The repeated slot.
        slot: usize,
    },

    /// An amount could not be parsed as a decimal.
    #[error("invalid amount: {value}")]
    InvalidAmount {
        /// The raw input.
        value: String,
    },

    /// A courier name is not on the roster.
    #[error("unknown courier: {name}")]
    UnknownCourier {
        /// The raw input.
        name: String,
    },

    // === Access Errors ===
    /// The admin view was requested without a password.
    #[error("admin password required")]
    AuthRequired,

    /// The admin password was wrong.
    #[error("incorrect admin password")]
    AuthFailure,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for deliverylog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
