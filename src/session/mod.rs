//! Workout session lifecycle, derived purely from the speed reading.
//!
//! Function-pointer finite state machine:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌────────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ State      │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├────────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ NotStarted │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Running    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Paused     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Ended      │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  └────────────┴───────────┴──────────┴───────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each speed reading calls `on_update` for the **current** state.  If it
//! returns `Some(next)`, the tracker runs `on_exit` for the current state,
//! then `on_enter` for the next.  The caller gets back a [`Transition`]
//! describing what happened, including the terminal
//! [`Transition::Ended`] carrying the finished record.

pub mod context;
pub mod states;

pub use context::{SessionContext, SessionRecord};

use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all session states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    NotStarted = 0,
    Running = 1,
    Paused = 2,
    Ended = 3,
}

impl SessionState {
    /// Total number of states; sizes the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `SessionState`.  Panics on out-of-range in
    /// debug builds; returns `Ended` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::NotStarted,
            1 => Self::Running,
            2 => Self::Paused,
            3 => Self::Ended,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Ended
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut SessionContext);

/// Signature for the per-reading update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut SessionContext) -> Option<SessionState>;

/// Static descriptor for a single session state.
pub struct StateDescriptor {
    pub id: SessionState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Transition outcome
// ---------------------------------------------------------------------------

/// What one speed reading did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// NotStarted, speed 0: reading discarded.
    Discarded,
    /// NotStarted → Running: a new record was created.
    Started { id: u64 },
    /// Running, speed > 0.
    Accepted,
    /// Running → Paused: this reading is not aggregated.
    Paused,
    /// Paused → Running after `paused_secs` of zero speed.
    Resumed { paused_secs: u64 },
    /// Paused, speed 0, timeout not reached.
    StillPaused { elapsed_secs: u64 },
    /// Paused → Ended: the finished record.  The consumer must `reset()`.
    Ended(SessionRecord),
    /// Already Ended; nothing changes until `reset()`.
    Ignored,
}

impl Transition {
    /// Whether the reading that caused this transition should be aggregated.
    pub fn aggregates(&self) -> bool {
        matches!(
            self,
            Self::Started { .. } | Self::Accepted | Self::Resumed { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tracker engine
// ---------------------------------------------------------------------------

/// The session state machine.
///
/// Owns the state table and the [`SessionContext`] threaded through every
/// handler call.
pub struct SessionTracker {
    /// Fixed-size table indexed by `SessionState as usize`.
    table: [StateDescriptor; SessionState::COUNT],
    /// Index of the currently active state.
    current: usize,
    ctx: SessionContext,
}

impl SessionTracker {
    pub fn new(pause_timeout_secs: u64, epoch_offset_secs: u64) -> Self {
        let mut tracker = Self {
            table: states::build_state_table(),
            current: SessionState::NotStarted as usize,
            ctx: SessionContext::new(pause_timeout_secs, epoch_offset_secs),
        };
        if let Some(enter) = tracker.table[tracker.current].on_enter {
            enter(&mut tracker.ctx);
        }
        tracker
    }

    /// Evaluate one speed reading (km/h) arriving at clock second `now`.
    pub fn observe(&mut self, speed_kmh: f64, now: u64) -> Transition {
        let prev = self.state();
        if prev == SessionState::Ended {
            return Transition::Ignored;
        }

        self.ctx.speed_kmh = speed_kmh;
        self.ctx.now = now;

        if let Some(next) = (self.table[self.current].on_update)(&mut self.ctx) {
            self.transition(next);
        }

        self.classify(prev)
    }

    /// Return to NotStarted and drop the record.  Invoked by whoever consumes
    /// [`Transition::Ended`]; never automatic.
    pub fn reset(&mut self) {
        if self.state() == SessionState::NotStarted {
            self.ctx.record = None;
            return;
        }
        self.transition(SessionState::NotStarted);
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        SessionState::from_index(self.current)
    }

    /// The live (or just-ended) record.
    pub fn record(&self) -> Option<&SessionRecord> {
        self.ctx.record.as_ref()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: SessionState) {
        let next_idx = next as usize;
        debug_assert_eq!(self.table[next_idx].id, next);

        info!(
            "Session transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(&mut self.ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(&mut self.ctx);
        }
    }

    fn classify(&self, prev: SessionState) -> Transition {
        use SessionState::{Ended, NotStarted, Paused, Running};

        match (prev, self.state()) {
            (NotStarted, NotStarted) => Transition::Discarded,
            (NotStarted, Running) => Transition::Started {
                id: self.ctx.record.map_or(0, |r| r.id),
            },
            (Running, Running) => Transition::Accepted,
            (Running, Paused) => Transition::Paused,
            (Paused, Running) => Transition::Resumed {
                paused_secs: self.ctx.last_pause_secs,
            },
            (Paused, Paused) => Transition::StillPaused {
                elapsed_secs: self.ctx.pause_elapsed(),
            },
            (Paused, Ended) => match self.ctx.record {
                Some(record) => Transition::Ended(record),
                None => Transition::Ignored,
            },
            _ => Transition::Ignored,
        }
    }
}
