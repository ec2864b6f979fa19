//! # DomainError
//!
//! Centralized error handling for the blob backend.
//! Every port and service returns [`DomainResult`]; adapters translate their own
//! failures into one of these variants at the boundary.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (e.g., blank content, bad page number, bad UUID)
    #[error("validation error: {0}")]
    Validation(String),

    /// No acting identity, or one that cannot be resolved
    #[error("unauthenticated: {0}")]
    Authentication(String),

    /// The acting user does not own the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (e.g., Blob, Like, User)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Uniqueness violation (e.g., duplicate username)
    #[error("conflict: {0}")]
    AlreadyExists(String),

    /// The user already liked this blob
    #[error("user {user_id} already liked blob {blob_id}")]
    AlreadyReacted { user_id: String, blob_id: String },

    /// Infrastructure failure, tagged with the failing operation
    #[error("store error in {op}: {message}")]
    Store { op: &'static str, message: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(op: &'static str, message: impl ToString) -> Self {
        Self::Store {
            op,
            message: message.to_string(),
        }
    }

    /// True for outcomes that are normal absence, not failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..))
    }
}

/// A specialized Result type for domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
