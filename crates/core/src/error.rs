//! Domain error model.

use thiserror::Error;

/// Result type used by the pure model crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures of the client-side model (malformed values only).
///
/// Transport and storage failures have their own error types in
/// `erpdash-client`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a malformed permission code).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
