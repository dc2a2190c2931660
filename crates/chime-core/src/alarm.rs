//! Alarm entities and value objects.

use crate::error::{DomainError, DomainResult};
use crate::worker::WorkerId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Smallest accepted alarm duration in seconds.
///
/// Requests at or below two seconds are rejected outright; an alarm that
/// short would expire inside the very first poll cycle.
pub const MIN_DURATION_SECS: u64 = 3;

/// Upper bound on the alarm message payload, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 63;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique identifier for an alarm.
///
/// Positive integer chosen by the submitter. Registry scans and status
/// listings run in ascending id order, so the ordering derives matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(u32);

impl AlarmId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AlarmId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ============================================================================
// Alarm Message
// ============================================================================

/// Validated alarm message payload.
///
/// Construction enforces the limits once, so the rest of the system can
/// pass messages around without re-checking: non-empty, at most
/// [`MAX_MESSAGE_BYTES`] bytes, single line. Oversized input is rejected,
/// never truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmMessage(String);

impl AlarmMessage {
    pub fn new(text: impl Into<String>) -> DomainResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if text.len() > MAX_MESSAGE_BYTES {
            return Err(DomainError::MessageTooLong { length: text.len() });
        }
        if text.contains('\n') || text.contains('\r') {
            return Err(DomainError::MessageHasLineBreak);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlarmMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AlarmMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Alarm Entity
// ============================================================================

/// A single pending alarm.
///
/// `deadline` is the absolute expiry instant (`now + duration` at
/// submission or reschedule). `duration_secs` keeps the requested run time
/// as submitted; the expiry announcement prints this value, not whatever
/// happens to remain. `owner` is `None` until a worker claims the alarm.
#[derive(Debug, Clone)]
pub struct Alarm {
    pub id: AlarmId,
    pub duration_secs: u64,
    pub deadline: Instant,
    pub created_at: DateTime<Utc>,
    pub owner: Option<WorkerId>,
    pub message: AlarmMessage,
}

impl Alarm {
    /// Creates an unowned alarm expiring `duration_secs` from now.
    pub fn new(id: AlarmId, duration_secs: u64, message: AlarmMessage) -> DomainResult<Self> {
        let deadline = Self::deadline_from_now(duration_secs)?;
        Ok(Self {
            id,
            duration_secs,
            deadline,
            created_at: Utc::now(),
            owner: None,
            message,
        })
    }

    /// Checks the duration floor shared by submission and reschedule.
    pub fn validate_duration(seconds: u64) -> DomainResult<()> {
        if seconds < MIN_DURATION_SECS {
            return Err(DomainError::DurationTooShort { seconds });
        }
        Ok(())
    }

    /// Computes the absolute expiry instant, enforcing the duration floor
    /// and rejecting durations the clock cannot carry.
    fn deadline_from_now(duration_secs: u64) -> DomainResult<Instant> {
        Self::validate_duration(duration_secs)?;
        Instant::now()
            .checked_add(Duration::from_secs(duration_secs))
            .ok_or(DomainError::DurationTooLong {
                seconds: duration_secs,
            })
    }

    /// Replaces duration and message, restarting the countdown from now.
    ///
    /// Ownership and `created_at` are preserved; the owning worker picks
    /// up the new values on its next poll. A rejected reschedule leaves
    /// the alarm untouched.
    pub fn reschedule(&mut self, duration_secs: u64, message: AlarmMessage) -> DomainResult<()> {
        let deadline = Self::deadline_from_now(duration_secs)?;
        self.duration_secs = duration_secs;
        self.deadline = deadline;
        self.message = message;
        Ok(())
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline <= now
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.remaining(now).as_secs()
    }

    pub fn is_owned_by(&self, worker: WorkerId) -> bool {
        self.owner == Some(worker)
    }
}
