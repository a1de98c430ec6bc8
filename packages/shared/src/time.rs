//! Wall-clock access.
//!
//! Chat timestamps are Unix epoch milliseconds (UTC), the unit peers put in
//! the `timestamp` field of every frame.

use chrono::Utc;

/// Source of the current time, injected into use cases.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        unix_millis_now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(i64);

impl FixedClock {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

pub fn unix_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}
