//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured pipeline events through
//! the `log` facade.  Whatever logger the host installs decides where they go.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::SessionStarted { id } => {
                info!("SESSION | started id={}", id);
            }
            AppEvent::SessionPaused { id } => {
                info!("SESSION | paused id={}", id);
            }
            AppEvent::SessionResumed { id, paused_secs } => {
                info!("SESSION | resumed id={} after {}s", id, paused_secs);
            }
            AppEvent::SessionEnded(summary) => match serde_json::to_string(summary) {
                Ok(json) => info!("SESSION | ended {}", json),
                Err(_) => info!("SESSION | ended {:?}", summary),
            },
            AppEvent::FrameDropped(e) => {
                warn!("FRAME | dropped: {}", e);
            }
            AppEvent::SnapshotEvicted {
                session_id,
                captured_at,
            } => {
                warn!(
                    "QUEUE | evicted snapshot id={} ts={}",
                    session_id, captured_at
                );
            }
            AppEvent::BatchDelivered { lines, attempts } => {
                info!("UPLOAD | delivered {} lines in {} attempt(s)", lines, attempts);
            }
            AppEvent::BatchDropped { lines, error } => {
                warn!("UPLOAD | dropped {} lines: {}", lines, error);
            }
            AppEvent::TransportLost(e) => {
                warn!("TRANSPORT | lost: {}", e);
            }
        }
    }
}
