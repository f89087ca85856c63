//! Outbound application events.
//!
//! The [`TelemetryService`](super::service::TelemetryService) and the
//! [`BatchUploader`](crate::upload::BatchUploader) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::{DecodeError, SinkError, TransportError};
use crate::telemetry::SessionSummary;

/// Structured events emitted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// First nonzero speed: a new session record exists.
    SessionStarted { id: u64 },

    /// Speed dropped to zero; the pause clock is running.
    SessionPaused { id: u64 },

    /// Speed came back before the pause timeout.
    SessionResumed { id: u64, paused_secs: u64 },

    /// The pause timeout elapsed.  Carries the final figures.
    SessionEnded(SessionSummary),

    /// A malformed frame was discarded.
    FrameDropped(DecodeError),

    /// The queue was full; its oldest snapshot was discarded.
    SnapshotEvicted { session_id: u64, captured_at: u64 },

    /// A batch reached the sink.
    BatchDelivered { lines: usize, attempts: u8 },

    /// A batch failed twice and was discarded.
    BatchDropped { lines: usize, error: SinkError },

    /// The frame source failed; the pipeline stops for this connection.
    TransportLost(TransportError),
}
