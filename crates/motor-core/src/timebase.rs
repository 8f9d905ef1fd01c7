use chrono::{DateTime, Utc};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    start: Instant,
}

impl TimeBase {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Monotonic microseconds since start.
    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Wall-clock time used to stamp samples.
    pub fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}
