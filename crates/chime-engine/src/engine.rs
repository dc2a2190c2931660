//! The engine context: registries, growth policy, and command dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chime_core::{
    Alarm, AlarmId, AlarmMessage, PendingAlarm, SlotStatus, StatusReport, WorkerId, WorkerStatus,
};
use chime_protocol::Command;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EVENT_BUFFER};
use crate::monitor;
use crate::registry::{AlarmRegistry, WorkerRegistry};
use crate::worker::{self, WorkerContext};

// ============================================================================
// Reply
// ============================================================================

/// Successful outcome of one console command, ready for rendering.
#[derive(Debug, Clone)]
pub enum Reply {
    Submitted(Alarm),
    Rescheduled(Alarm),
    Canceled(Alarm),
    Report(StatusReport),
}

// ============================================================================
// Alarm Engine
// ============================================================================

/// Shared context threaded through every part of the system. All state
/// lives here; there are no globals.
pub struct AlarmEngine {
    alarms: Arc<AlarmRegistry>,
    workers: Arc<WorkerRegistry>,
    config: EngineConfig,
    events: broadcast::Sender<EngineEvent>,
}

impl AlarmEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            alarms: Arc::new(AlarmRegistry::new()),
            workers: Arc::new(WorkerRegistry::new()),
            config,
            events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a receiver for fired-alarm and pool-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn alarm_count(&self) -> EngineResult<usize> {
        Ok(self.alarms.len()?)
    }

    pub fn worker_count(&self) -> EngineResult<usize> {
        Ok(self.workers.len()?)
    }

    /// Registers a new alarm, growing the worker pool first when the
    /// current pool is already at its serving ratio. Rejections leave the
    /// registries untouched.
    pub fn submit(
        &self,
        id: AlarmId,
        duration_secs: u64,
        message: AlarmMessage,
    ) -> EngineResult<Alarm> {
        let alarm = Alarm::new(id, duration_secs, message)?;
        if self.alarms.contains(id)? {
            return Err(EngineError::DuplicateAlarm(id));
        }
        self.grow_if_needed()?;
        self.alarms.insert(alarm.clone())?;
        debug!(alarm = %id, duration_secs, "Alarm registered");
        Ok(alarm)
    }

    /// Spawns one worker when the pool cannot absorb another alarm at the
    /// configured ratio. Counts are taken before the triggering alarm is
    /// inserted, so the first submission always creates worker 1.
    fn grow_if_needed(&self) -> EngineResult<Option<WorkerId>> {
        let workers = self.workers.len()?;
        let alarms = self.alarms.len()?;
        if self.config.slot_capacity.saturating_mul(workers) > alarms {
            return Ok(None);
        }
        if workers >= self.config.max_workers {
            return Err(EngineError::WorkerLimitReached(self.config.max_workers));
        }

        let id = self.workers.register(self.config.slot_capacity)?;
        let handle = worker::spawn(WorkerContext {
            id,
            alarms: Arc::clone(&self.alarms),
            workers: Arc::clone(&self.workers),
            events: self.events.clone(),
            poll_interval: self.config.poll_interval(),
            slot_capacity: self.config.slot_capacity,
        });
        self.workers.attach_handle(id, handle)?;
        let _ = self.events.send(EngineEvent::WorkerSpawned { id });
        info!(worker = %id, pool = workers + 1, "Alarm worker created");
        Ok(Some(id))
    }

    /// Replaces an existing alarm's duration and message and restarts its
    /// countdown. The serving worker, if any, keeps the alarm.
    pub fn reschedule(
        &self,
        id: AlarmId,
        duration_secs: u64,
        message: AlarmMessage,
    ) -> EngineResult<Alarm> {
        Alarm::validate_duration(duration_secs)?;
        let updated = self.alarms.reschedule(id, duration_secs, message)?;
        debug!(alarm = %id, duration_secs, "Alarm rescheduled");
        Ok(updated)
    }

    /// Removes an alarm before it fires. The serving worker notices the
    /// removal on its next poll and releases the slot quietly.
    pub fn cancel(&self, id: AlarmId) -> EngineResult<Alarm> {
        match self.alarms.remove(id)? {
            Some(alarm) => {
                debug!(alarm = %id, "Alarm canceled");
                Ok(alarm)
            }
            None => Err(EngineError::UnknownAlarm(id)),
        }
    }

    /// Builds a point-in-time view of the whole system: every worker with
    /// its slot assignments, plus alarms no slot references yet. Each live
    /// alarm appears exactly once.
    pub fn status_report(&self) -> EngineResult<StatusReport> {
        let workers = self.workers.snapshot()?;
        let alarms = self.alarms.snapshot()?;
        let now = Instant::now();
        let generated_at = Utc::now();

        let mut by_id: BTreeMap<AlarmId, Alarm> =
            alarms.into_iter().map(|alarm| (alarm.id, alarm)).collect();

        let workers = workers
            .into_iter()
            .map(|snapshot| WorkerStatus {
                id: snapshot.id,
                started_at: snapshot.started_at,
                slots: snapshot
                    .slots
                    .iter()
                    .map(|entry| {
                        let id = (*entry)?;
                        let alarm = by_id.remove(&id)?;
                        Some(SlotStatus {
                            alarm_id: alarm.id,
                            duration_secs: alarm.duration_secs,
                            remaining_secs: alarm.remaining_secs(now),
                            created_at: alarm.created_at,
                            message: alarm.message.to_string(),
                        })
                    })
                    .collect(),
            })
            .collect();

        let pending = by_id
            .into_values()
            .map(|alarm| PendingAlarm {
                alarm_id: alarm.id,
                duration_secs: alarm.duration_secs,
                remaining_secs: alarm.remaining_secs(now),
                message: alarm.message.to_string(),
            })
            .collect();

        Ok(StatusReport {
            generated_at,
            workers,
            pending,
        })
    }

    /// Dispatches one parsed console command.
    pub fn execute(&self, command: Command) -> EngineResult<Reply> {
        match command {
            Command::Start {
                id,
                duration_secs,
                message,
            } => Ok(Reply::Submitted(self.submit(id, duration_secs, message)?)),
            Command::Change {
                id,
                duration_secs,
                message,
            } => Ok(Reply::Rescheduled(
                self.reschedule(id, duration_secs, message)?,
            )),
            Command::Cancel { id } => Ok(Reply::Canceled(self.cancel(id)?)),
            Command::View => Ok(Reply::Report(self.status_report()?)),
        }
    }

    /// Starts the periodic stats monitor tied to `cancel_token`.
    pub fn spawn_monitor(&self, cancel_token: CancellationToken) -> JoinHandle<()> {
        monitor::spawn_monitor_task(
            Arc::clone(&self.alarms),
            Arc::clone(&self.workers),
            cancel_token,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> AlarmMessage {
        AlarmMessage::new(text).expect("valid test message")
    }

    fn quiet_engine() -> AlarmEngine {
        // Long poll interval keeps workers asleep for the whole test.
        AlarmEngine::new(EngineConfig {
            poll_interval_ms: 60_000,
            ..EngineConfig::default()
        })
    }

    #[tokio::test]
    async fn test_submit_rejects_duplicate_id() {
        let engine = quiet_engine();
        engine
            .submit(AlarmId::new(1), 10, message("first"))
            .expect("submit");

        let err = engine
            .submit(AlarmId::new(1), 20, message("second"))
            .expect_err("duplicate");
        assert_eq!(err, EngineError::DuplicateAlarm(AlarmId::new(1)));
        assert_eq!(engine.alarm_count().expect("count"), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_short_duration_without_growing() {
        let engine = quiet_engine();
        let err = engine
            .submit(AlarmId::new(1), 2, message("too soon"))
            .expect_err("short duration");
        assert!(matches!(err, EngineError::Domain(_)));
        assert_eq!(engine.alarm_count().expect("count"), 0);
        assert_eq!(engine.worker_count().expect("count"), 0);
    }

    #[tokio::test]
    async fn test_pool_grows_at_the_serving_ratio() {
        let engine = quiet_engine();

        engine
            .submit(AlarmId::new(1), 600, message("a"))
            .expect("submit");
        assert_eq!(engine.worker_count().expect("count"), 1);

        engine
            .submit(AlarmId::new(2), 600, message("b"))
            .expect("submit");
        assert_eq!(engine.worker_count().expect("count"), 1);

        engine
            .submit(AlarmId::new(3), 600, message("c"))
            .expect("submit");
        assert_eq!(engine.worker_count().expect("count"), 2);
    }

    #[tokio::test]
    async fn test_submit_fails_at_worker_limit() {
        let engine = AlarmEngine::new(EngineConfig {
            poll_interval_ms: 60_000,
            slot_capacity: 2,
            max_workers: 1,
        });

        engine
            .submit(AlarmId::new(1), 600, message("a"))
            .expect("submit");
        engine
            .submit(AlarmId::new(2), 600, message("b"))
            .expect("submit");

        let err = engine
            .submit(AlarmId::new(3), 600, message("c"))
            .expect_err("limit");
        assert_eq!(err, EngineError::WorkerLimitReached(1));
        assert!(err.is_fatal());
        assert_eq!(engine.alarm_count().expect("count"), 2);
    }

    #[tokio::test]
    async fn test_cancel_and_reschedule_reject_unknown_ids() {
        let engine = quiet_engine();

        let err = engine.cancel(AlarmId::new(5)).expect_err("unknown");
        assert_eq!(err, EngineError::UnknownAlarm(AlarmId::new(5)));

        let err = engine
            .reschedule(AlarmId::new(5), 10, message("x"))
            .expect_err("unknown");
        assert_eq!(err, EngineError::UnknownAlarm(AlarmId::new(5)));
    }

    #[tokio::test]
    async fn test_reschedule_checks_duration_before_lookup() {
        let engine = quiet_engine();
        let err = engine
            .reschedule(AlarmId::new(5), 1, message("x"))
            .expect_err("short duration");
        assert!(matches!(err, EngineError::Domain(_)));
    }

    #[tokio::test]
    async fn test_report_lists_unclaimed_alarms_as_pending() {
        let engine = quiet_engine();
        engine
            .submit(AlarmId::new(4), 30, message("meeting"))
            .expect("submit");

        let report = engine.status_report().expect("report");
        assert_eq!(report.alarm_total(), 1);
        assert_eq!(report.workers.len(), 1);
        assert!(report.workers.iter().all(|w| w.occupied() == 0));

        let pending = report.pending.first().expect("pending alarm");
        assert_eq!(pending.alarm_id, AlarmId::new(4));
        assert_eq!(pending.duration_secs, 30);
        assert_eq!(pending.message, "meeting");
        assert!(pending.remaining_secs <= 30);
    }

    #[tokio::test]
    async fn test_execute_dispatches_all_commands() {
        let engine = quiet_engine();

        let reply = engine
            .execute(Command::Start {
                id: AlarmId::new(1),
                duration_secs: 15,
                message: message("stretch"),
            })
            .expect("start");
        assert!(matches!(reply, Reply::Submitted(ref a) if a.id == AlarmId::new(1)));

        let reply = engine
            .execute(Command::Change {
                id: AlarmId::new(1),
                duration_secs: 20,
                message: message("stretch more"),
            })
            .expect("change");
        assert!(matches!(reply, Reply::Rescheduled(ref a) if a.duration_secs == 20));

        let reply = engine.execute(Command::View).expect("view");
        assert!(matches!(reply, Reply::Report(ref r) if r.alarm_total() == 1));

        let reply = engine
            .execute(Command::Cancel { id: AlarmId::new(1) })
            .expect("cancel");
        assert!(matches!(reply, Reply::Canceled(ref a) if a.message.as_str() == "stretch more"));
        assert_eq!(engine.alarm_count().expect("count"), 0);
    }
}
