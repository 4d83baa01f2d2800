//! Error types for the asset register core.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and provides clear messages for
//! the web-layer collaborator to translate into request-level rejections.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors that occur before any storage call is issued.
///
/// A validation error always means the whole request is rejected; nothing
/// was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A filter or update request named a field the registry does not know.
    #[error("Unknown field: '{field}'")]
    UnknownField {
        /// The offending field name, exactly as supplied.
        field: String,
    },

    /// The field exists but is not in the bulk-editable allow-list.
    #[error("Field '{field}' is not bulk-editable")]
    NotBulkEditable {
        /// The field name.
        field: String,
    },

    /// A raw value does not fit the field's kind.
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// The raw value as supplied.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A caller identity was empty after trimming.
    #[error("Caller identity cannot be empty")]
    EmptyIdentity,
}

/// Top-level error type for the asset register core.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Input validation failed; no storage call was made.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A storage call failed. Propagated unmodified from the backend.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invariant violation inside the core itself.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl RegisterError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;
