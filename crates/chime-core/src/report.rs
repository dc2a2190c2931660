//! Read-only status report DTOs.
//!
//! Built by the engine when the console asks for `View_Alarms`. The report
//! is a point-in-time snapshot: every registered alarm appears exactly once,
//! either inside the slot of the worker holding it or under `pending` when
//! no slot references it yet.

use crate::alarm::AlarmId;
use crate::worker::WorkerId;
use chrono::{DateTime, Utc};

/// One alarm as seen inside a worker slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotStatus {
    pub alarm_id: AlarmId,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

/// One worker and its slot contents, in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatus {
    pub id: WorkerId,
    pub started_at: DateTime<Utc>,
    pub slots: Vec<Option<SlotStatus>>,
}

impl WorkerStatus {
    /// Number of slots currently holding an alarm.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// A registered alarm no worker slot references (not yet claimed, or
/// claimed but not yet recorded in a slot).
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlarm {
    pub alarm_id: AlarmId,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub message: String,
}

/// Snapshot of the whole pool: workers in id order plus unreferenced alarms.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub workers: Vec<WorkerStatus>,
    pub pending: Vec<PendingAlarm>,
}

impl StatusReport {
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty() && self.pending.is_empty()
    }

    /// Total alarms visible in the report (slots plus pending).
    pub fn alarm_total(&self) -> usize {
        let in_slots: usize = self.workers.iter().map(WorkerStatus::occupied).sum();
        in_slots + self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: u32) -> SlotStatus {
        SlotStatus {
            alarm_id: AlarmId::new(id),
            duration_secs: 10,
            remaining_secs: 7,
            created_at: Utc::now(),
            message: "m".to_string(),
        }
    }

    #[test]
    fn test_occupied_counts_filled_slots() {
        let status = WorkerStatus {
            id: WorkerId::new(1),
            started_at: Utc::now(),
            slots: vec![Some(slot(5)), None],
        };
        assert_eq!(status.occupied(), 1);
    }

    #[test]
    fn test_report_totals() {
        let report = StatusReport {
            generated_at: Utc::now(),
            workers: vec![WorkerStatus {
                id: WorkerId::new(1),
                started_at: Utc::now(),
                slots: vec![Some(slot(5)), Some(slot(6))],
            }],
            pending: vec![PendingAlarm {
                alarm_id: AlarmId::new(9),
                duration_secs: 30,
                remaining_secs: 30,
                message: "later".to_string(),
            }],
        };
        assert!(!report.is_empty());
        assert_eq!(report.alarm_total(), 3);
    }

    #[test]
    fn test_empty_report() {
        let report = StatusReport {
            generated_at: Utc::now(),
            workers: Vec::new(),
            pending: Vec::new(),
        };
        assert!(report.is_empty());
        assert_eq!(report.alarm_total(), 0);
    }
}
