//! Engine events broadcast to console subscribers.

use chime_core::{AlarmId, WorkerId};

/// Capacity of the broadcast channel carrying engine events.
///
/// A subscriber that falls more than this far behind loses the oldest
/// events: its next receive reports how many were skipped, then the
/// stream resumes in order with the events still buffered. Skipped
/// events are not replayed.
pub const EVENT_BUFFER: usize = 100;

/// Asynchronous notifications produced by the worker pool. The console
/// prints these; dropping a subscriber never blocks the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// An alarm reached its deadline and was removed by its worker.
    AlarmFired {
        id: AlarmId,
        duration_secs: u64,
        message: String,
    },
    /// The growth policy added a worker to the pool.
    WorkerSpawned { id: WorkerId },
    /// A worker ran out of alarms and removed itself from the pool.
    WorkerRetired { id: WorkerId },
}
