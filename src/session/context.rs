//! Shared mutable context threaded through every session state handler.
//!
//! `SessionContext` is the blackboard the handlers read from and write to:
//! the reading being evaluated, the wall-clock second it arrived, the
//! live [`SessionRecord`] and the tunables that govern transitions.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Session record
// ---------------------------------------------------------------------------

/// One workout, from first nonzero speed to the pause timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    /// Unix second the session started; fixed for the record's lifetime.
    pub id: u64,
    /// Clock second the session started.
    pub start_time: u64,
    /// Seconds spent paused in completed pauses.  Never decreases.
    pub paused_total: u64,
    /// Clock second the current pause began, while Paused.
    pub pause_started: Option<u64>,
    /// Clock second the session ended, once Ended.
    pub ended_at: Option<u64>,
}

impl SessionRecord {
    pub fn new(start_time: u64, epoch_offset_secs: u64) -> Self {
        Self {
            id: start_time + epoch_offset_secs,
            start_time,
            paused_total: 0,
            pause_started: None,
            ended_at: None,
        }
    }

    /// Active seconds as of `now`: elapsed minus completed and ongoing pauses.
    /// Frozen at `ended_at` once the session has ended.
    pub fn active_secs(&self, now: u64) -> u64 {
        let end = self.ended_at.unwrap_or(now);
        let ongoing = self.pause_started.map_or(0, |p| end.saturating_sub(p));
        end.saturating_sub(self.start_time)
            .saturating_sub(self.paused_total + ongoing)
    }

    /// Seconds the current pause has lasted, or 0 if not paused.
    pub fn pause_elapsed(&self, now: u64) -> u64 {
        self.pause_started.map_or(0, |p| now.saturating_sub(p))
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct SessionContext {
    // -- Input --
    /// Speed of the reading being evaluated (km/h).
    pub speed_kmh: f64,
    /// Clock second the reading arrived.
    pub now: u64,

    // -- Session --
    /// Live record; `None` until the first nonzero speed.
    pub record: Option<SessionRecord>,
    /// Length of the pause that the last resume (or end) closed.
    pub last_pause_secs: u64,

    // -- Configuration --
    /// Continuous zero-speed seconds that end a paused session.
    pub pause_timeout_secs: u64,
    /// Added to clock seconds to produce Unix-second session ids.
    pub epoch_offset_secs: u64,
}

impl SessionContext {
    pub fn new(pause_timeout_secs: u64, epoch_offset_secs: u64) -> Self {
        Self {
            speed_kmh: 0.0,
            now: 0,
            record: None,
            last_pause_secs: 0,
            pause_timeout_secs,
            epoch_offset_secs,
        }
    }

    /// Whether the reading under evaluation shows the flywheel moving.
    pub fn is_moving(&self) -> bool {
        self.speed_kmh > 0.0
    }

    /// Seconds into the current pause.
    pub fn pause_elapsed(&self) -> u64 {
        self.record.map_or(0, |r| r.pause_elapsed(self.now))
    }
}
