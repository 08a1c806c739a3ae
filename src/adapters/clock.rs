//! Clock implementations: the real wall clock, and a simulated one for
//! replaying recorded sessions without waiting.

use crate::ports::clock_port::Clock;
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::time::Duration;

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Time only moves when the loop sleeps, plus a fixed step per sleep so a
/// zero-length wait still makes progress.
pub struct SimulatedClock {
    now: Cell<DateTime<Utc>>,
    min_step: chrono::Duration,
}

impl SimulatedClock {
    pub fn new(start: DateTime<Utc>, min_step: chrono::Duration) -> Self {
        Self {
            now: Cell::new(start),
            min_step,
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration)
            .unwrap_or(self.min_step)
            .max(self.min_step);
        self.now.set(self.now.get() + step);
    }
}
