//! Shared-state registries for alarms and workers.
//!
//! Both registries wrap a `BTreeMap` behind a coarse `std::sync::Mutex`.
//! Every operation takes the lock, does its whole read-modify-write, and
//! releases it before returning, so no guard is ever held across an
//! `.await`. Ordered keys give deterministic iteration: claim scans and
//! status snapshots always walk ids in ascending order.
//!
//! ```text
//!  console task ----+
//!                   |  insert / remove / reschedule / snapshot
//!                   v
//!            +---------------+        +----------------+
//!            | AlarmRegistry |        | WorkerRegistry |
//!            +---------------+        +----------------+
//!                   ^                         ^
//!                   |  claim_next / poll_slot |  set_slot / deregister
//!  worker tasks ----+-------------------------+
//! ```
//!
//! A poisoned lock is reported as `RegistryError::LockPoisoned` instead of
//! propagating the panic into callers.

mod alarms;
mod workers;

pub use alarms::{AlarmRegistry, SlotPoll};
pub use workers::{WorkerRecord, WorkerRegistry, WorkerSnapshot};

use chime_core::{AlarmId, DomainError, WorkerId};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{registry} registry lock poisoned by a panicked holder")]
    LockPoisoned { registry: &'static str },

    #[error("Alarm {0} is already registered")]
    DuplicateAlarm(AlarmId),

    #[error("Alarm {0} not found")]
    AlarmNotFound(AlarmId),

    #[error("Worker {0} not found")]
    WorkerNotFound(WorkerId),

    #[error("Worker {worker} has no slot {index}")]
    SlotOutOfRange { worker: WorkerId, index: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
