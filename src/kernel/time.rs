use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds since a clock's origin. Fractional, like a high-resolution UI timer.
pub type Millis = f64;

/// Source of timestamps for monitors.
///
/// Timestamps only need to be comparable within one clock; no wall-clock meaning is implied.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Real monotonic clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: Millis) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    pub fn advance(&self, ms: Millis) {
        // Time never runs backwards
        if ms.is_finite() && ms > 0.0 {
            self.now.set(self.now.get() + ms);
        }
    }

    pub fn set(&self, ms: Millis) {
        if ms.is_finite() && ms >= self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
