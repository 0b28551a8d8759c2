//! Error taxonomy for the collection core.

use thiserror::Error;

/// Errors raised by catalog construction, instrumenter construction,
/// zone discovery and kstat reads.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Bad constructor input. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An external utility could not be run or exited non-zero.
    #[error("Failed to execute {command}: {reason}")]
    Execution { command: String, reason: String },

    /// A single source group could not be read for a zone.
    #[error("Failed to read {group}: {reason}")]
    ReadFailure { group: String, reason: String },
}

impl CollectorError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CollectorError::InvalidArgument(msg.into())
    }

    pub fn read_failure(group: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectorError::ReadFailure {
            group: group.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, CollectorError>;
