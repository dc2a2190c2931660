//! The alarm registry: every live alarm, keyed and ordered by id.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chime_core::{Alarm, AlarmId, AlarmMessage, WorkerId};
use tokio::time::Instant;

use super::{RegistryError, RegistryResult};

// ============================================================================
// Slot Poll Outcome
// ============================================================================

/// What a worker learns when it rechecks one of its held alarms.
///
/// The check and any removal happen under a single lock acquisition, so
/// for a given alarm exactly one caller can ever see `Expired`.
#[derive(Debug, Clone)]
pub enum SlotPoll {
    /// Still registered, still owned by the caller, not yet due.
    Waiting,
    /// Due now. The alarm has been removed; the caller announces it.
    Expired(Alarm),
    /// No longer registered. It was canceled while held.
    Vanished,
    /// Registered but owned elsewhere. The caller releases the slot.
    Reassigned,
}

// ============================================================================
// Alarm Registry
// ============================================================================

/// Concurrent map of alarm id to alarm, shared by the console task and
/// every worker.
#[derive(Debug, Default)]
pub struct AlarmRegistry {
    alarms: Mutex<BTreeMap<AlarmId, Alarm>>,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, BTreeMap<AlarmId, Alarm>>> {
        self.alarms
            .lock()
            .map_err(|_| RegistryError::LockPoisoned { registry: "alarm" })
    }

    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn contains(&self, id: AlarmId) -> RegistryResult<bool> {
        Ok(self.lock()?.contains_key(&id))
    }

    /// Registers a new alarm. Ids must be unique across the registry.
    pub fn insert(&self, alarm: Alarm) -> RegistryResult<()> {
        let mut alarms = self.lock()?;
        match alarms.entry(alarm.id) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateAlarm(alarm.id)),
            Entry::Vacant(slot) => {
                slot.insert(alarm);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: AlarmId) -> RegistryResult<Option<Alarm>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    /// Removes an alarm, returning it if it was present. Removing an
    /// unknown id, or removing from an empty registry, is a quiet no-op
    /// so cancel races resolve without special cases.
    pub fn remove(&self, id: AlarmId) -> RegistryResult<Option<Alarm>> {
        Ok(self.lock()?.remove(&id))
    }

    /// Replaces an alarm's duration and message in place and restarts its
    /// countdown. Ownership is untouched: whichever worker holds the alarm
    /// keeps serving it and picks up the new deadline on its next poll.
    pub fn reschedule(
        &self,
        id: AlarmId,
        duration_secs: u64,
        message: AlarmMessage,
    ) -> RegistryResult<Alarm> {
        let mut alarms = self.lock()?;
        let alarm = alarms
            .get_mut(&id)
            .ok_or(RegistryError::AlarmNotFound(id))?;
        alarm.reschedule(duration_secs, message)?;
        Ok(alarm.clone())
    }

    /// Claims the lowest-id unowned alarm for `worker`, marking it owned
    /// inside the same lock acquisition. Returns `None` when every alarm
    /// already has an owner.
    pub fn claim_next(&self, worker: WorkerId) -> RegistryResult<Option<Alarm>> {
        let mut alarms = self.lock()?;
        for alarm in alarms.values_mut() {
            if alarm.owner.is_none() {
                alarm.owner = Some(worker);
                return Ok(Some(alarm.clone()));
            }
        }
        Ok(None)
    }

    /// Rechecks a held alarm on behalf of `worker` and removes it if due.
    pub fn poll_slot(
        &self,
        id: AlarmId,
        worker: WorkerId,
        now: Instant,
    ) -> RegistryResult<SlotPoll> {
        let mut alarms = self.lock()?;
        let Some(alarm) = alarms.get(&id) else {
            return Ok(SlotPoll::Vanished);
        };
        if !alarm.is_owned_by(worker) {
            return Ok(SlotPoll::Reassigned);
        }
        if !alarm.is_due(now) {
            return Ok(SlotPoll::Waiting);
        }
        match alarms.remove(&id) {
            Some(alarm) => Ok(SlotPoll::Expired(alarm)),
            None => Ok(SlotPoll::Vanished),
        }
    }

    /// Clones every alarm in ascending id order.
    pub fn snapshot(&self) -> RegistryResult<Vec<Alarm>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn message(text: &str) -> AlarmMessage {
        AlarmMessage::new(text).expect("valid test message")
    }

    fn alarm(id: u32, duration_secs: u64) -> Alarm {
        Alarm::new(AlarmId::new(id), duration_secs, message("test alarm"))
            .expect("valid test alarm")
    }

    #[tokio::test]
    async fn test_insert_and_len() {
        let registry = AlarmRegistry::new();
        assert_eq!(registry.len().expect("len"), 0);
        assert!(registry.is_empty().expect("is_empty"));

        registry.insert(alarm(1, 10)).expect("insert");
        registry.insert(alarm(2, 10)).expect("insert");

        assert_eq!(registry.len().expect("len"), 2);
        assert!(registry.contains(AlarmId::new(1)).expect("contains"));
        assert!(!registry.contains(AlarmId::new(3)).expect("contains"));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(7, 10)).expect("insert");

        let err = registry.insert(alarm(7, 20)).expect_err("duplicate");
        assert_eq!(err, RegistryError::DuplicateAlarm(AlarmId::new(7)));
        assert_eq!(registry.len().expect("len"), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_quiet() {
        let registry = AlarmRegistry::new();
        assert!(registry.remove(AlarmId::new(9)).expect("remove").is_none());

        registry.insert(alarm(1, 10)).expect("insert");
        assert!(registry.remove(AlarmId::new(9)).expect("remove").is_none());
        assert_eq!(registry.len().expect("len"), 1);

        let removed = registry.remove(AlarmId::new(1)).expect("remove");
        assert_eq!(removed.map(|a| a.id), Some(AlarmId::new(1)));
        assert!(registry.remove(AlarmId::new(1)).expect("remove").is_none());
    }

    #[tokio::test]
    async fn test_claim_next_takes_lowest_unowned_id() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(30, 10)).expect("insert");
        registry.insert(alarm(10, 10)).expect("insert");
        registry.insert(alarm(20, 10)).expect("insert");

        let worker = WorkerId::new(1);
        let first = registry.claim_next(worker).expect("claim");
        assert_eq!(first.map(|a| a.id), Some(AlarmId::new(10)));

        let second = registry.claim_next(worker).expect("claim");
        assert_eq!(second.map(|a| a.id), Some(AlarmId::new(20)));
    }

    #[tokio::test]
    async fn test_claim_next_skips_owned_alarms() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(1, 10)).expect("insert");

        let holder = WorkerId::new(1);
        let rival = WorkerId::new(2);
        registry.claim_next(holder).expect("claim");

        assert!(registry.claim_next(rival).expect("claim").is_none());

        let held = registry.get(AlarmId::new(1)).expect("get");
        assert_eq!(held.and_then(|a| a.owner), Some(holder));
    }

    #[tokio::test]
    async fn test_poll_slot_waits_until_due() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(1, 10)).expect("insert");
        let worker = WorkerId::new(1);
        registry.claim_next(worker).expect("claim");

        let early = registry
            .poll_slot(AlarmId::new(1), worker, Instant::now())
            .expect("poll");
        assert!(matches!(early, SlotPoll::Waiting));
        assert_eq!(registry.len().expect("len"), 1);
    }

    #[tokio::test]
    async fn test_poll_slot_removes_due_alarm() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(1, 10)).expect("insert");
        let worker = WorkerId::new(1);
        registry.claim_next(worker).expect("claim");

        let later = Instant::now() + Duration::from_secs(60);
        let due = registry
            .poll_slot(AlarmId::new(1), worker, later)
            .expect("poll");
        match due {
            SlotPoll::Expired(fired) => assert_eq!(fired.id, AlarmId::new(1)),
            other => panic!("expected Expired, got {other:?}"),
        }
        assert!(registry.is_empty().expect("is_empty"));

        let again = registry
            .poll_slot(AlarmId::new(1), worker, later)
            .expect("poll");
        assert!(matches!(again, SlotPoll::Vanished));
    }

    #[tokio::test]
    async fn test_poll_slot_reports_canceled_alarm_as_vanished() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(5, 10)).expect("insert");
        let worker = WorkerId::new(1);
        registry.claim_next(worker).expect("claim");

        registry.remove(AlarmId::new(5)).expect("remove");

        let outcome = registry
            .poll_slot(AlarmId::new(5), worker, Instant::now())
            .expect("poll");
        assert!(matches!(outcome, SlotPoll::Vanished));
    }

    #[tokio::test]
    async fn test_poll_slot_reports_foreign_owner_as_reassigned() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(5, 10)).expect("insert");
        registry.claim_next(WorkerId::new(1)).expect("claim");

        let outcome = registry
            .poll_slot(AlarmId::new(5), WorkerId::new(2), Instant::now())
            .expect("poll");
        assert!(matches!(outcome, SlotPoll::Reassigned));

        // A replacement alarm under the same id starts unowned, which also
        // reads as reassigned to the stale holder.
        registry.remove(AlarmId::new(5)).expect("remove");
        registry.insert(alarm(5, 10)).expect("insert");
        let outcome = registry
            .poll_slot(AlarmId::new(5), WorkerId::new(1), Instant::now())
            .expect("poll");
        assert!(matches!(outcome, SlotPoll::Reassigned));
    }

    #[tokio::test]
    async fn test_reschedule_updates_alarm_in_place() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(3, 10)).expect("insert");
        registry.claim_next(WorkerId::new(4)).expect("claim");

        let updated = registry
            .reschedule(AlarmId::new(3), 25, message("new text"))
            .expect("reschedule");
        assert_eq!(updated.duration_secs, 25);
        assert_eq!(updated.message.as_str(), "new text");
        assert_eq!(updated.owner, Some(WorkerId::new(4)));

        let err = registry
            .reschedule(AlarmId::new(8), 25, message("new text"))
            .expect_err("unknown id");
        assert_eq!(err, RegistryError::AlarmNotFound(AlarmId::new(8)));
    }

    #[tokio::test]
    async fn test_reschedule_rejects_short_duration() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(3, 10)).expect("insert");

        let err = registry
            .reschedule(AlarmId::new(3), 2, message("too soon"))
            .expect_err("short duration");
        assert!(matches!(err, RegistryError::Domain(_)));

        let kept = registry.get(AlarmId::new(3)).expect("get");
        assert_eq!(kept.map(|a| a.duration_secs), Some(10));
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_by_id() {
        let registry = AlarmRegistry::new();
        registry.insert(alarm(9, 10)).expect("insert");
        registry.insert(alarm(1, 10)).expect("insert");
        registry.insert(alarm(4, 10)).expect("insert");

        let ids: Vec<u32> = registry
            .snapshot()
            .expect("snapshot")
            .iter()
            .map(|a| a.id.as_u32())
            .collect();
        assert_eq!(ids, vec![1, 4, 9]);
    }
}
