//! Engine-level error types.

use chime_core::{AlarmId, DomainError};
use thiserror::Error;

use crate::registry::RegistryError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Alarm {0} already exists")]
    DuplicateAlarm(AlarmId),

    #[error("No alarm with id {0}")]
    UnknownAlarm(AlarmId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Worker limit of {0} reached, alarm not accepted")]
    WorkerLimitReached(usize),

    #[error("{registry} registry lock poisoned by a panicked holder")]
    LockPoisoned { registry: &'static str },

    #[error("Internal registry fault: {0}")]
    Internal(RegistryError),
}

impl EngineError {
    /// Whether the engine's shared state can no longer be trusted. Fatal
    /// errors stop the console loop; the rest are reported and retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::WorkerLimitReached(_)
                | EngineError::LockPoisoned { .. }
                | EngineError::Internal(_)
        )
    }
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateAlarm(id) => EngineError::DuplicateAlarm(id),
            RegistryError::AlarmNotFound(id) => EngineError::UnknownAlarm(id),
            RegistryError::Domain(domain) => EngineError::Domain(domain),
            RegistryError::LockPoisoned { registry } => EngineError::LockPoisoned { registry },
            other @ (RegistryError::WorkerNotFound(_) | RegistryError::SlotOutOfRange { .. }) => {
                EngineError::Internal(other)
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Tests
// ============================================================================
