//! Errors raised by catalog records and their identifiers.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Why a supply record or identifier was refused.
///
/// Movement rejections (insufficient stock, bad quantities) have their own
/// type in the inventory crate; this one covers the record layer underneath.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad supply details: blank name, inverted thresholds, negative price.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No supply with that id in the store.
    #[error("not found")]
    NotFound,

    /// The record moved past the version the writer started from.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// True for a stale-version write; the record itself is intact.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
