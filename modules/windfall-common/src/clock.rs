//! Injected clock.
//!
//! The ledger write cutoff and the keyword schedule are hour-of-day gated.
//! Both evaluate against this trait instead of reading the wall clock, so
//! tests can pin the hour.

use chrono::{DateTime, Local, Utc};

pub trait Clock: Send + Sync {
    /// Current time, UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Local hour of day, 0-23. Schedule gates key off local time.
    fn local_hour(&self) -> u32;

    /// Current unix timestamp in seconds.
    fn unix_now(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        use chrono::Timelike;
        Local::now().hour()
    }
}

/// Test clock pinned to a fixed instant and hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub hour: u32,
}

impl FixedClock {
    pub fn at_hour(hour: u32) -> Self {
        Self {
            now: Utc::now(),
            hour,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_hour(&self) -> u32 {
        self.hour
    }
}
