//! Console output formatting.
//!
//! Pure string builders: the binary decides where lines go (stdout for
//! reports and announcements, stderr for rejections) and when the prompt
//! is redrawn.

use chime_core::{AlarmId, StatusReport, WorkerId};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// The interactive prompt.
pub const PROMPT: &str = "alarm> ";

/// Uniform rejection line for unparseable or invalid commands.
pub const BAD_COMMAND: &str = "Bad command";

/// The expiry announcement: the alarm's requested duration and message.
pub fn announcement(duration_secs: u64, message: &str) -> String {
    format!("({duration_secs}) {message}")
}

/// Printed when the growth policy brings a new worker into the pool.
pub fn worker_created(id: WorkerId) -> String {
    format!("New alarm worker {id} created")
}

/// Confirmation for a successful `Change_Alarm`.
pub fn alarm_changed(
    id: AlarmId,
    at: DateTime<Utc>,
    remaining_secs: u64,
    message: &str,
) -> String {
    format!(
        "Alarm {id} changed at {}: {remaining_secs}s left \"{message}\"",
        at.format("%H:%M:%S")
    )
}

/// Confirmation for a successful `Cancel_Alarm`.
pub fn alarm_canceled(
    id: AlarmId,
    at: DateTime<Utc>,
    remaining_secs: u64,
    message: &str,
) -> String {
    format!(
        "Alarm {id} canceled at {}: {remaining_secs}s left \"{message}\"",
        at.format("%H:%M:%S")
    )
}

/// Multi-line `View_Alarms` report.
///
/// One block per worker in id order, occupied slots labelled `1a.`, `1b.`,
/// and so on, followed by alarms no slot references. Ends with a newline.
pub fn status_report(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Alarms at {}:", report.generated_at.format("%H:%M:%S"));

    for worker in &report.workers {
        let _ = writeln!(out, "Worker {} assigned:", worker.id);
        for (index, slot) in worker.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            let _ = writeln!(
                out,
                "  {}{}. Alarm {}: created {}, {}s left \"{}\"",
                worker.id,
                slot_label(index),
                slot.alarm_id,
                slot.created_at.format("%H:%M:%S"),
                slot.remaining_secs,
                slot.message,
            );
        }
    }

    if !report.pending.is_empty() {
        let _ = writeln!(out, "Unassigned:");
        for alarm in &report.pending {
            let _ = writeln!(
                out,
                "  Alarm {}: {}s left \"{}\"",
                alarm.alarm_id, alarm.remaining_secs, alarm.message,
            );
        }
    }

    out
}

/// Slot letter for report lines: `a` for the first slot, `b` for the
/// second, wrapping after `z`.
fn slot_label(index: usize) -> char {
    char::from(b'a' + (index % 26) as u8)
}
