//! The worker registry: one descriptor per live worker task.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chime_core::{AlarmId, WorkerId};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::{RegistryError, RegistryResult};

// ============================================================================
// Worker Record
// ============================================================================

/// Bookkeeping for one worker task. The record owns the task's join
/// handle, so deregistering a worker lets its handle drop and the task
/// run detached to completion.
#[derive(Debug)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub started_at: DateTime<Utc>,
    /// Slot assignments as last reported by the worker itself.
    pub slots: Vec<Option<AlarmId>>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerRecord {
    fn new(id: WorkerId, slot_capacity: usize) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            slots: vec![None; slot_capacity],
            handle: None,
        }
    }
}

/// Immutable copy of a record for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub started_at: DateTime<Utc>,
    pub slots: Vec<Option<AlarmId>>,
}

// ============================================================================
// Worker Registry
// ============================================================================

#[derive(Debug, Default)]
struct WorkerTable {
    records: BTreeMap<WorkerId, WorkerRecord>,
    /// Monotonic id source. Ids are never reused, even after retirement.
    next_id: u32,
}

#[derive(Debug, Default)]
pub struct WorkerRegistry {
    table: Mutex<WorkerTable>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, WorkerTable>> {
        self.table
            .lock()
            .map_err(|_| RegistryError::LockPoisoned { registry: "worker" })
    }

    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.lock()?.records.is_empty())
    }

    /// Creates a record for a new worker and hands back its id. The task
    /// itself is spawned by the caller; its handle arrives afterwards via
    /// `attach_handle`.
    pub fn register(&self, slot_capacity: usize) -> RegistryResult<WorkerId> {
        let mut table = self.lock()?;
        table.next_id = table.next_id.saturating_add(1);
        let id = WorkerId::new(table.next_id);
        table.records.insert(id, WorkerRecord::new(id, slot_capacity));
        Ok(id)
    }

    /// Stores the join handle for a freshly spawned worker. If the record
    /// is already gone the worker retired before we got here; dropping the
    /// handle leaves the task detached, which is what retirement wants.
    pub fn attach_handle(&self, id: WorkerId, handle: JoinHandle<()>) -> RegistryResult<()> {
        let mut table = self.lock()?;
        if let Some(record) = table.records.get_mut(&id) {
            record.handle = Some(handle);
        }
        Ok(())
    }

    /// Records what a worker's slot currently serves.
    pub fn set_slot(
        &self,
        id: WorkerId,
        index: usize,
        value: Option<AlarmId>,
    ) -> RegistryResult<()> {
        let mut table = self.lock()?;
        let record = table
            .records
            .get_mut(&id)
            .ok_or(RegistryError::WorkerNotFound(id))?;
        let slot = record
            .slots
            .get_mut(index)
            .ok_or(RegistryError::SlotOutOfRange { worker: id, index })?;
        *slot = value;
        Ok(())
    }

    /// Drops a worker's record. Returns whether a record was present;
    /// deregistering an unknown or already-retired worker is a quiet no-op.
    pub fn deregister(&self, id: WorkerId) -> RegistryResult<bool> {
        Ok(self.lock()?.records.remove(&id).is_some())
    }

    /// Clones every record's reportable state in ascending id order.
    pub fn snapshot(&self) -> RegistryResult<Vec<WorkerSnapshot>> {
        Ok(self
            .lock()?
            .records
            .values()
            .map(|record| WorkerSnapshot {
                id: record.id,
                started_at: record.started_at,
                slots: record.slots.clone(),
            })
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
