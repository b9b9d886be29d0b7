//! Error types for the Cairn row store.

use crate::types::Position;
use thiserror::Error;

/// Result type alias for Cairn operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for row store and index operations.
///
/// Nothing in this workspace recovers from an error locally: every kind is
/// propagated unchanged to the transaction layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The index variant cannot perform this structural operation.
    #[error("Feature not supported: {operation}")]
    Unsupported { operation: String },
    /// Column access outside the row arity.
    #[error("Column index {index} out of range for row with {arity} columns")]
    OutOfRange { index: usize, arity: usize },
    /// The record store reported an I/O or consistency failure.
    #[error("Storage failure: {message}")]
    Storage { message: String },
    /// A stored record could not be decoded.
    #[error("Corrupted record: {message}")]
    Corrupted { message: String },
    /// Linking or unlinking a large object failed.
    #[error("Large object failure: {message}")]
    LargeObject { message: String },
    /// No record lives at the requested position.
    #[error("No record at position {position}")]
    RecordNotFound { position: Position },
    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// Invalid database configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl Error {
    /// Creates an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Error::Unsupported {
            operation: operation.into(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(index: usize, arity: usize) -> Self {
        Error::OutOfRange { index, arity }
    }

    /// Creates a storage failure error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// Creates a corrupted record error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::Corrupted {
            message: message.into(),
        }
    }

    /// Creates a large object error.
    pub fn large_object(message: impl Into<String>) -> Self {
        Error::LargeObject {
            message: message.into(),
        }
    }

    /// Creates a record not found error.
    pub fn record_not_found(position: Position) -> Self {
        Error::RecordNotFound { position }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error is an unsupported-capability signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}
