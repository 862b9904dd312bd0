// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session clock: monotonic per-frame deltas.

use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source. Readings are offsets from an arbitrary origin.
pub trait TimeSource {
    /// Current reading.
    fn now(&self) -> Duration;
}

/// `std::time::Instant`-backed source for native hosts.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    /// Source whose origin is "now".
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// One per session, reused for every frame.
///
/// `tick` measures from the previous tick (or from construction for the first
/// one), so the first frame sees a near-zero delta. A source that steps
/// backwards yields `0.0`, never a negative delta.
pub struct Clock {
    source: Rc<dyn TimeSource>,
    start: Duration,
    last: Duration,
}

impl Clock {
    /// Start a clock on `source`.
    pub fn new(source: Rc<dyn TimeSource>) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            last: start,
        }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = self.source.now();
        let delta = now.saturating_sub(self.last);
        self.last = self.last.max(now);
        delta.as_secs_f32()
    }

    /// Seconds since construction, as of the last tick.
    pub fn elapsed(&self) -> f32 {
        self.last.saturating_sub(self.start).as_secs_f32()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("start", &self.start)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
