//! Domain-specific error types following the panic-free policy.

use crate::alarm::{MAX_MESSAGE_BYTES, MIN_DURATION_SECS};
use thiserror::Error;

/// Errors that can occur when constructing or mutating domain values.
///
/// All variants are validation failures: the caller handed us a value the
/// domain rules reject. They are always recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Requested alarm duration is below the accepted minimum
    #[error("Alarm duration must be at least {MIN_DURATION_SECS} seconds, got {seconds}")]
    DurationTooShort { seconds: u64 },

    /// Requested alarm duration pushes the deadline past what the clock
    /// can represent
    #[error("Alarm duration of {seconds} seconds is too large to schedule")]
    DurationTooLong { seconds: u64 },

    /// Alarm message contains no characters
    #[error("Alarm message must not be empty")]
    EmptyMessage,

    /// Alarm message exceeds the fixed byte limit
    #[error("Alarm message exceeds {MAX_MESSAGE_BYTES} bytes (got {length})")]
    MessageTooLong { length: usize },

    /// Alarm message spans multiple lines
    #[error("Alarm message must not contain line breaks")]
    MessageHasLineBreak,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
