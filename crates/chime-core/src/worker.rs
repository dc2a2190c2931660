//! Worker identity.

use std::fmt;

/// Unique identifier for an alarm worker.
///
/// Allocated by the worker registry from a counter that starts at 1 and
/// only ever increases, so an id is never reused within a process even
/// after its worker retires. There is no reserved "unowned" value; alarm
/// ownership is expressed as `Option<WorkerId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(WorkerId::new(3).to_string(), "3");
    }

    #[test]
    fn test_ids_order_numerically() {
        assert!(WorkerId::new(2) < WorkerId::new(10));
    }
}
