//! Periodic engine statistics.
//!
//! A background task samples the registries and this process's memory
//! footprint once a minute and writes the numbers to the log. Purely
//! advisory: sampling failures degrade to zeros rather than affecting
//! the pool.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{AlarmRegistry, WorkerRegistry};

/// How often engine stats are logged.
pub const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Resident memory above this many megabytes logs a warning.
pub const HIGH_MEMORY_THRESHOLD_MB: u64 = 50;

// ============================================================================
// Stats Sampler
// ============================================================================

struct StatsSampler {
    system: System,
    pid: Pid,
}

impl StatsSampler {
    fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(process::id()),
        }
    }

    /// Resident set size of this process in megabytes, zero if the
    /// process table cannot be read.
    fn memory_mb(&mut self) -> u64 {
        self.system.refresh_all();
        self.system
            .process(self.pid)
            .map(|proc| proc.memory() / 1024 / 1024)
            .unwrap_or(0)
    }
}

// ============================================================================
// Monitor Task
// ============================================================================

pub fn spawn_monitor_task(
    alarms: Arc<AlarmRegistry>,
    workers: Arc<WorkerRegistry>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sampler = StatsSampler::new();
        let mut tick = interval(STATS_INTERVAL);
        info!(
            interval_secs = STATS_INTERVAL.as_secs(),
            "Engine stats monitor started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    info!("Engine stats monitor shutting down");
                    break;
                }

                _ = tick.tick() => {
                    log_stats(&alarms, &workers, &mut sampler);
                }
            }
        }

        debug!("Engine stats monitor task completed");
    })
}

fn log_stats(alarms: &AlarmRegistry, workers: &WorkerRegistry, sampler: &mut StatsSampler) {
    let alarm_count = alarms.len().unwrap_or(0);
    let worker_count = workers.len().unwrap_or(0);
    let memory_mb = sampler.memory_mb();

    if memory_mb > HIGH_MEMORY_THRESHOLD_MB {
        warn!(
            alarms = alarm_count,
            workers = worker_count,
            memory_mb,
            threshold_mb = HIGH_MEMORY_THRESHOLD_MB,
            "HIGH MEMORY: engine footprint above threshold"
        );
    } else {
        debug!(
            alarms = alarm_count,
            workers = worker_count,
            memory_mb,
            "Engine stats"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
