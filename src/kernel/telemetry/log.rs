use std::fmt;

use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;

use super::event::TelemetryEvent;
use crate::kernel::config::MAX_CAPACITY;

/// Fixed-capacity event log. Appends past capacity overwrite the oldest entry.
pub struct EventLog {
    buffer: HeapRb<TelemetryEvent>,
}

impl EventLog {
    /// Capacity is clamped to `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: HeapRb::new(capacity.clamp(1, MAX_CAPACITY)),
        }
    }

    /// Appends `event`, returning the entry evicted to make room, if any.
    pub fn push(&mut self, event: TelemetryEvent) -> Option<TelemetryEvent> {
        self.buffer.push_overwrite(event)
    }

    /// Owned copy, oldest first.
    pub fn snapshot(&self) -> Vec<TelemetryEvent> {
        self.buffer.iter().cloned().collect()
    }

    /// Owned copy of at most `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<TelemetryEvent> {
        self.buffer.iter().rev().take(n).cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TelemetryEvent> + '_ {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity().get()
    }

    pub fn clear(&mut self) {
        Consumer::clear(&mut self.buffer);
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
