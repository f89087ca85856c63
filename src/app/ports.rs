//! Port traits: the hexagonal boundary between the pipeline and the outside world.
//!
//! ```text
//!   FrameSource ──▶ TelemetryService ──▶ TelemetrySink
//!                        │
//!                        ├──▶ StatusDisplay
//!                        └──▶ EventSink
//! ```
//!
//! Transports, displays, HTTP clients and clocks implement these traits.
//! The pipeline consumes them via generics, so it runs under test with
//! in-memory mocks and no hardware or network.

use crate::error::{SinkError, TransportError};
use crate::telemetry::TelemetrySnapshot;

// ───────────────────────────────────────────────────────────────
// Frame source (driven adapter: sensor transport → pipeline)
// ───────────────────────────────────────────────────────────────

/// One Indoor Bike Data notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    /// [`Clock`] second at which the notification arrived.  Session timing
    /// uses this, not the time the frame is processed.
    pub received_at: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, received_at: u64) -> Self {
        Self { data, received_at }
    }
}

/// Delivers complete Indoor Bike Data frames, one per notification.
///
/// Connection management (discovery, subscribe, reconnect) lives behind
/// this trait.  Implementations stamp each frame when it arrives, so frames
/// buffered while the executor is busy keep their real timing.  An `Err`
/// ends the current connection; the caller decides whether and when to
/// reconnect.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn next_frame(&mut self) -> Result<Frame, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: pipeline → time-series store)
// ───────────────────────────────────────────────────────────────

/// Accepts one encoded line-protocol batch per call.
pub trait TelemetrySink {
    /// Post `payload` (newline-joined lines).  `Ok` means the sink accepted it.
    fn post(&mut self, payload: &str) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// Status display (driven adapter: pipeline → screen / console)
// ───────────────────────────────────────────────────────────────

/// Read-only consumer of the live session state.
pub trait StatusDisplay {
    /// Show a short status text ("Not started", "Session paused", ...).
    fn render_status(&mut self, text: &str);

    /// Show the current aggregates.
    fn render_snapshot(&mut self, snapshot: &TelemetrySnapshot);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: pipeline → logging / observability)
// ───────────────────────────────────────────────────────────────

/// The pipeline emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Wall-clock seconds.  The epoch is whatever the device clock uses;
/// `TelemetryConfig::epoch_offset_secs` converts it to Unix time.
pub trait Clock {
    fn now_secs(&self) -> u64;
}
