//! Parsed console commands.

use chime_core::{AlarmId, AlarmMessage};

/// A validated command line.
///
/// Ids are positive, durations are raw (the engine applies the duration
/// floor so a too-short request is rejected in the same place a duplicate
/// id is), messages are already length- and line-checked.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `Start_Alarm(<id>): <duration> <message>` - submit a new alarm
    Start {
        id: AlarmId,
        duration_secs: u64,
        message: AlarmMessage,
    },
    /// `Change_Alarm(<id>): <duration> <message>` - reschedule in place
    Change {
        id: AlarmId,
        duration_secs: u64,
        message: AlarmMessage,
    },
    /// `Cancel_Alarm(<id>)` - remove a pending alarm
    Cancel { id: AlarmId },
    /// `View_Alarms` - status report of workers, slots and pending alarms
    View,
}

impl Command {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Change { .. } => "change",
            Command::Cancel { .. } => "cancel",
            Command::View => "view",
        }
    }
}
