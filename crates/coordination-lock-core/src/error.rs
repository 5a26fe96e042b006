//! Error types for distributed lock operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during lock operations.
///
/// Simple call sites usually project these down to "lock not acquired"
/// with [`Result::ok`]; operational tooling can match on the variant.
#[derive(Error, Debug)]
pub enum LockError {
    /// The resource path (or one of its ancestors) could not be created.
    #[error("failed to create resource path: {0}")]
    PathCreation(String),

    /// The coordination service reported a transport or session failure.
    #[error("coordination service error: {0}")]
    Coordination(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Lock acquisition timed out while the request was still blocked.
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),

    /// The request node backing a held lock disappeared.
    #[error("lock was lost: {0}")]
    LockLost(String),

    /// Invalid lock name or handle.
    #[error("invalid lock name: {0}")]
    InvalidName(String),
}

impl LockError {
    /// Returns `true` if this error only means the resource was contended.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
