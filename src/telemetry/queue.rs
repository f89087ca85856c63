//! Bounded FIFO decoupling the sampling rate from the upload rate.
//!
//! Overflow policy is drop-oldest: a full queue evicts its oldest entry to
//! make room, so a slow consumer loses old data, never the newest.

use log::debug;

use super::TelemetrySnapshot;

/// Default queue depth: 20 one-second snapshots.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Fixed-capacity drop-oldest queue.
pub struct TelemetryQueue<T = TelemetrySnapshot, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    buf: heapless::Deque<T, N>,
    /// Entries evicted to make room since construction.
    evicted: u64,
}

impl<T, const N: usize> TelemetryQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Deque::new(),
            evicted: 0,
        }
    }

    /// Append `item`.  Returns the evicted oldest entry if the queue was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let oldest = if self.buf.is_full() {
            self.buf.pop_front()
        } else {
            None
        };

        let _ = self.buf.push_back(item);
        if oldest.is_some() {
            self.evicted += 1;
            debug!("Telemetry queue full ({}), evicted oldest", N);
        }
        oldest
    }

    /// Remove up to `max` entries, oldest first.
    pub fn drain(&mut self, max: usize) -> Vec<T> {
        let take = max.min(self.buf.len());
        let mut out = Vec::with_capacity(take);
        while out.len() < take {
            match self.buf.pop_front() {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }

    pub fn peek_oldest(&self) -> Option<&T> {
        self.buf.front()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }
}

impl<T, const N: usize> Default for TelemetryQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
