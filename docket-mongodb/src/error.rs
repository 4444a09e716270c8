//! Error types for query building and execution.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Result type for docket operations.
pub type DocResult<T> = Result<T, DocketError>;

/// Errors that can occur while building, executing or connecting.
///
/// Validation errors are raised before any I/O and leave the accumulated
/// query state untouched. Driver failures are wrapped with the server's
/// message and, when the server reported one, its error code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocketError {
    /// A required argument was missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The database rejected a write or administrative operation.
    #[error("persistence error: {message}{}", code_suffix(.code))]
    Persistence {
        /// Message reported by the driver.
        message: String,
        /// Server error code, when available.
        code: Option<i32>,
    },

    /// The database rejected a read.
    #[error("query error: {message}{}", code_suffix(.code))]
    Query {
        /// Message reported by the driver.
        message: String,
        /// Server error code, when available.
        code: Option<i32>,
    },

    /// Connection bootstrap failed.
    #[error("connection error: {0}")]
    Connection(String),
}

fn code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (code {})", code),
        None => String::new(),
    }
}

impl DocketError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>, code: Option<i32>) -> Self {
        Self::Persistence {
            message: message.into(),
            code,
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>, code: Option<i32>) -> Self {
        Self::Query {
            message: message.into(),
            code,
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Wrap a driver failure raised by a write or administrative command.
    pub fn from_driver_write(err: mongodb::error::Error) -> Self {
        let code = server_code(&err);
        Self::persistence(err.to_string(), code)
    }

    /// Wrap a driver failure raised by a read.
    pub fn from_driver_read(err: mongodb::error::Error) -> Self {
        let code = server_code(&err);
        Self::query(err.to_string(), code)
    }

    /// Server error code carried by this error, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Persistence { code, .. } | Self::Query { code, .. } => *code,
            _ => None,
        }
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a persistence error.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        _ => None,
    }
}
