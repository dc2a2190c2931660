//! The alarm worker task.
//!
//! Each worker owns a fixed set of slots and runs the same cycle forever:
//! sleep one poll interval, fill empty slots by claiming unowned alarms,
//! recheck held slots against the shared registry, then yield. The shared
//! registry is the source of truth on every cycle, so cancels, changes,
//! and ownership moves made between cycles are observed without any
//! signaling channel to the worker.
//!
//! A worker whose slots all come up empty after a cycle deregisters
//! itself and returns. The pool grows back through the engine's growth
//! policy, never by resurrecting a retired worker.

use std::sync::Arc;
use std::time::Duration;

use chime_core::{AlarmId, WorkerId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::events::EngineEvent;
use crate::registry::{AlarmRegistry, RegistryResult, SlotPoll, WorkerRegistry};

/// A held slot logs a liveness line every this many cycles.
const HEARTBEAT_CYCLES: u64 = 5;

// ============================================================================
// Worker Context
// ============================================================================

/// Everything a worker task needs, captured at spawn time.
pub(crate) struct WorkerContext {
    pub(crate) id: WorkerId,
    pub(crate) alarms: Arc<AlarmRegistry>,
    pub(crate) workers: Arc<WorkerRegistry>,
    pub(crate) events: broadcast::Sender<EngineEvent>,
    pub(crate) poll_interval: Duration,
    pub(crate) slot_capacity: usize,
}

pub(crate) fn spawn(ctx: WorkerContext) -> JoinHandle<()> {
    tokio::spawn(run(ctx))
}

// ============================================================================
// Poll Loop
// ============================================================================

async fn run(ctx: WorkerContext) {
    let mut slots: Vec<Option<AlarmId>> = vec![None; ctx.slot_capacity];
    let mut cycle: u64 = 0;
    debug!(worker = %ctx.id, slots = ctx.slot_capacity, "Alarm worker started");

    loop {
        sleep(ctx.poll_interval).await;
        cycle = cycle.wrapping_add(1);

        if let Err(error) = poll_cycle(&ctx, &mut slots, cycle) {
            error!(worker = %ctx.id, %error, "Alarm worker stopping after registry fault");
            let _ = ctx.workers.deregister(ctx.id);
            return;
        }

        if slots.iter().all(Option::is_none) {
            retire(&ctx, cycle);
            return;
        }

        tokio::task::yield_now().await;
    }
}

/// One pass over every slot. Registry faults abort the cycle and bubble
/// up to stop the worker.
fn poll_cycle(
    ctx: &WorkerContext,
    slots: &mut [Option<AlarmId>],
    cycle: u64,
) -> RegistryResult<()> {
    let now = Instant::now();
    for (index, slot) in slots.iter_mut().enumerate() {
        match *slot {
            None => {
                if let Some(alarm) = ctx.alarms.claim_next(ctx.id)? {
                    *slot = Some(alarm.id);
                    record_slot(ctx, index, *slot);
                    debug!(
                        worker = %ctx.id,
                        alarm = %alarm.id,
                        remaining_secs = alarm.remaining_secs(now),
                        "Claimed alarm"
                    );
                }
            }
            Some(id) => match ctx.alarms.poll_slot(id, ctx.id, now)? {
                SlotPoll::Waiting => {
                    if cycle % HEARTBEAT_CYCLES == 0 {
                        debug!(worker = %ctx.id, alarm = %id, "Holding alarm");
                    }
                }
                SlotPoll::Expired(alarm) => {
                    let _ = ctx.events.send(EngineEvent::AlarmFired {
                        id: alarm.id,
                        duration_secs: alarm.duration_secs,
                        message: alarm.message.to_string(),
                    });
                    info!(
                        worker = %ctx.id,
                        alarm = %alarm.id,
                        duration_secs = alarm.duration_secs,
                        "Alarm fired"
                    );
                    *slot = None;
                    record_slot(ctx, index, None);
                }
                SlotPoll::Vanished => {
                    debug!(worker = %ctx.id, alarm = %id, "Held alarm was canceled");
                    *slot = None;
                    record_slot(ctx, index, None);
                }
                SlotPoll::Reassigned => {
                    debug!(worker = %ctx.id, alarm = %id, "Held alarm changed owner");
                    *slot = None;
                    record_slot(ctx, index, None);
                }
            },
        }
    }
    Ok(())
}

/// Mirrors a slot change into the worker registry. Failure to mirror is
/// logged but never stops the worker; the local slot array stays
/// authoritative for the poll loop itself.
fn record_slot(ctx: &WorkerContext, index: usize, value: Option<AlarmId>) {
    if let Err(error) = ctx.workers.set_slot(ctx.id, index, value) {
        warn!(worker = %ctx.id, index, %error, "Failed to mirror slot state");
    }
}

fn retire(ctx: &WorkerContext, cycle: u64) {
    if let Err(error) = ctx.workers.deregister(ctx.id) {
        warn!(worker = %ctx.id, %error, "Failed to deregister retiring worker");
    }
    let _ = ctx.events.send(EngineEvent::WorkerRetired { id: ctx.id });
    debug!(worker = %ctx.id, cycles = cycle, "Alarm worker retired");
}
