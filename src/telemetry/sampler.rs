//! Sampling cadence.
//!
//! The sampler takes a snapshot the moment a session is seen running, then
//! once per `sample_interval_ms` while it keeps running.  Outside Running it
//! only polls, at `idle_poll_interval_ms`, waiting for the next start.

use core::time::Duration;

use crate::config::TelemetryConfig;

/// Fires once per elapsed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u32,
    elapsed_ms: u32,
}

impl IntervalTimer {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
        }
    }

    /// Advance by `delta_ms`.  Returns `true` if the interval elapsed.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        if self.elapsed_ms >= self.interval_ms {
            // Carry the remainder, but never more than one interval's worth.
            self.elapsed_ms = (self.elapsed_ms - self.interval_ms) % self.interval_ms;
            true
        } else {
            false
        }
    }

    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}

/// Decides when the sampler task pushes a snapshot.
pub struct Sampler {
    timer: IntervalTimer,
    idle_poll_ms: u32,
    was_running: bool,
    samples_taken: u64,
}

impl Sampler {
    pub fn new(sample_interval_ms: u32, idle_poll_ms: u32) -> Self {
        Self {
            timer: IntervalTimer::new(sample_interval_ms),
            idle_poll_ms: idle_poll_ms.max(1),
            was_running: false,
            samples_taken: 0,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.sample_interval_ms, config.idle_poll_interval_ms)
    }

    /// Record `delta_ms` passing with the session `running` (or not).
    /// Returns `true` if a snapshot should be taken now.
    pub fn tick(&mut self, delta_ms: u32, running: bool) -> bool {
        if !running {
            self.was_running = false;
            return false;
        }

        let fire = if self.was_running {
            self.timer.tick(delta_ms)
        } else {
            self.was_running = true;
            self.timer.restart();
            true
        };
        if fire {
            self.samples_taken += 1;
        }
        fire
    }

    /// How long the sampler task sleeps before the next tick.
    pub fn next_delay(&self, running: bool) -> Duration {
        let ms = if running {
            self.timer.interval_ms()
        } else {
            self.idle_poll_ms
        };
        Duration::from_millis(u64::from(ms))
    }

    pub fn samples_taken(&self) -> u64 {
        self.samples_taken
    }
}
