//! Chime Core - Shared types for the chime alarm console
//!
//! This crate provides the domain types shared between the scheduling
//! engine (chime-engine) and the command surface (chime-protocol).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.
//! Deadline arithmetic is checked; durations the clock cannot carry are
//! rejected as a [`DomainError`], never overflowed.

pub mod alarm;
pub mod error;
pub mod report;
pub mod worker;

// Re-exports for convenience
pub use alarm::{Alarm, AlarmId, AlarmMessage, MAX_MESSAGE_BYTES, MIN_DURATION_SECS};
pub use error::{DomainError, DomainResult};
pub use report::{PendingAlarm, SlotStatus, StatusReport, WorkerStatus};
pub use worker::WorkerId;
