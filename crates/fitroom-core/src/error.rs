//! Error types for the Fitroom live session service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the live session domain.
///
/// This provides typed, structured error variants so that callers (use cases,
/// HTTP handlers) can branch on the error kind without string matching.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FitroomError {
    /// Entity not found error with type information
    #[error("{entity_type} not found: '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The caller is not allowed to perform the operation
    /// (not a room member, not a participant, not host, not controller).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation conflicts with current state
    /// (duplicate active call, call full, already joined, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed or out-of-range input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Data access error (repository/storage layer)
    #[error("data access error: {0}")]
    DataAccess(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl FitroomError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns true if this is a Forbidden error
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

/// Result alias used throughout the Fitroom crates.
pub type Result<T> = std::result::Result<T, FitroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = FitroomError::not_found("call", "abc-123");
        assert_eq!(err.to_string(), "call not found: 'abc-123'");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_kind_predicates() {
        assert!(FitroomError::conflict("call is full").is_conflict());
        assert!(FitroomError::forbidden("not the host").is_forbidden());
    }
}
