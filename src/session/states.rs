//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  NOT_STARTED ──[speed > 0]──▶ RUNNING ◀──[speed > 0]──┐
//!       ▲                          │                    │
//!       │                     [speed == 0]              │
//!    reset()                       ▼                    │
//!       │                       PAUSED ─────────────────┘
//!       │                          │
//!       │              [speed == 0 for pause timeout]
//!       │                          ▼
//!       └────────────────────── ENDED (terminal)
//! ```

use super::context::{SessionContext, SessionRecord};
use super::{SessionState, StateDescriptor};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per tracker.
pub fn build_state_table() -> [StateDescriptor; SessionState::COUNT] {
    [
        // Index 0: NotStarted
        StateDescriptor {
            id: SessionState::NotStarted,
            name: "NotStarted",
            on_enter: Some(not_started_enter),
            on_exit: None,
            on_update: not_started_update,
        },
        // Index 1: Running
        StateDescriptor {
            id: SessionState::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 2: Paused
        StateDescriptor {
            id: SessionState::Paused,
            name: "Paused",
            on_enter: Some(paused_enter),
            on_exit: Some(paused_exit),
            on_update: paused_update,
        },
        // Index 3: Ended
        StateDescriptor {
            id: SessionState::Ended,
            name: "Ended",
            on_enter: Some(ended_enter),
            on_exit: None,
            on_update: ended_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NOT_STARTED
// ═══════════════════════════════════════════════════════════════════════════

fn not_started_enter(ctx: &mut SessionContext) {
    ctx.record = None;
    ctx.last_pause_secs = 0;
    debug!("NOT_STARTED: waiting for the flywheel to move");
}

fn not_started_update(ctx: &mut SessionContext) -> Option<SessionState> {
    ctx.is_moving().then_some(SessionState::Running)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut SessionContext) {
    if ctx.record.is_none() {
        let record = SessionRecord::new(ctx.now, ctx.epoch_offset_secs);
        info!("RUNNING: session {} started", record.id);
        ctx.record = Some(record);
    } else {
        info!("RUNNING: resumed after {}s pause", ctx.last_pause_secs);
    }
}

fn running_update(ctx: &mut SessionContext) -> Option<SessionState> {
    (!ctx.is_moving()).then_some(SessionState::Paused)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PAUSED
// ═══════════════════════════════════════════════════════════════════════════

fn paused_enter(ctx: &mut SessionContext) {
    if let Some(record) = ctx.record.as_mut() {
        record.pause_started = Some(ctx.now);
    }
    info!("PAUSED: speed 0, session ends after {}s", ctx.pause_timeout_secs);
}

fn paused_update(ctx: &mut SessionContext) -> Option<SessionState> {
    if ctx.is_moving() {
        return Some(SessionState::Running);
    }
    if ctx.pause_elapsed() >= ctx.pause_timeout_secs {
        return Some(SessionState::Ended);
    }
    None
}

/// Fold the closing pause into `paused_total`, whether resuming or ending.
fn paused_exit(ctx: &mut SessionContext) {
    let now = ctx.now;
    if let Some(record) = ctx.record.as_mut() {
        let elapsed = record.pause_elapsed(now);
        record.paused_total += elapsed;
        record.pause_started = None;
        ctx.last_pause_secs = elapsed;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ENDED (terminal until reset)
// ═══════════════════════════════════════════════════════════════════════════

fn ended_enter(ctx: &mut SessionContext) {
    if let Some(record) = ctx.record.as_mut() {
        record.ended_at = Some(ctx.now);
        info!(
            "ENDED: session {} closed, {}s active, {}s paused",
            record.id,
            record.active_secs(ctx.now),
            record.paused_total
        );
    }
}

fn ended_update(_ctx: &mut SessionContext) -> Option<SessionState> {
    None
}
