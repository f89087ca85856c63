//! Mock adapters for integration tests.
//!
//! Records every event, post and render so tests can assert on the full
//! history without a sensor, network or screen.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use pedalstream::adapters::time::ManualClock;
use pedalstream::app::events::AppEvent;
use pedalstream::app::ports::{EventSink, Frame, FrameSource, StatusDisplay, TelemetrySink};
use pedalstream::error::{SinkError, TransportError};
use pedalstream::telemetry::TelemetrySnapshot;

// ── Frames ────────────────────────────────────────────────────

/// Flags 0x0244: speed, cadence, power, heart rate.
pub fn bike_frame(speed_centi_kmh: u16, cadence_half_rpm: u16, power: i16, hr: u8) -> Vec<u8> {
    let mut f = 0x0244u16.to_le_bytes().to_vec();
    f.extend_from_slice(&speed_centi_kmh.to_le_bytes());
    f.extend_from_slice(&cadence_half_rpm.to_le_bytes());
    f.extend_from_slice(&power.to_le_bytes());
    f.push(hr);
    f
}

#[allow(dead_code)]
pub fn riding(hr: u8) -> Vec<u8> {
    bike_frame(2500, 170, 180, hr)
}

#[allow(dead_code)]
pub fn stopped() -> Vec<u8> {
    bike_frame(0, 0, 0, 0)
}

// ── Event recorder ────────────────────────────────────────────

/// Shares its log so tests keep a handle after moving the sink.
#[derive(Clone, Default)]
pub struct RecordingEvents {
    pub log: Rc<RefCell<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<AppEvent> {
        self.log.borrow().clone()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&mut self, event: &AppEvent) {
        self.log.borrow_mut().push(event.clone());
    }
}

// ── Sink ──────────────────────────────────────────────────────

/// Accepts every post except the next `fail_next`, which fail with `error`.
pub struct MockSink {
    pub posted: Vec<String>,
    pub fail_next: usize,
    pub error: SinkError,
}

#[allow(dead_code)]
impl MockSink {
    pub fn new() -> Self {
        Self {
            posted: Vec::new(),
            fail_next: 0,
            error: SinkError::Unreachable,
        }
    }

    pub fn failing(n: usize) -> Self {
        Self {
            fail_next: n,
            ..Self::new()
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.posted.iter().flat_map(|p| p.lines())
    }
}

impl TelemetrySink for MockSink {
    fn post(&mut self, payload: &str) -> Result<(), SinkError> {
        self.posted.push(payload.to_owned());
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(self.error);
        }
        Ok(())
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub statuses: Vec<String>,
    pub snapshots: usize,
}

impl StatusDisplay for RecordingDisplay {
    fn render_status(&mut self, text: &str) {
        if self.statuses.last().map(String::as_str) != Some(text) {
            self.statuses.push(text.to_owned());
        }
    }

    fn render_snapshot(&mut self, _snapshot: &TelemetrySnapshot) {
        self.snapshots += 1;
    }
}

// ── Frame source ──────────────────────────────────────────────

/// Replays `(arrival second, frame)` pairs, waiting `gap` of real time
/// before each so the other tasks get to run, then fails with `end`.
///
/// By default the clock follows each arrival.  A backlogged source leaves
/// the clock alone, modelling frames that queued up while the executor was
/// busy and are consumed long after they arrived.
pub struct ScriptedSource<'c> {
    clock: &'c ManualClock,
    frames: VecDeque<(u64, Vec<u8>)>,
    gap: Duration,
    end: TransportError,
    moves_clock: bool,
}

impl<'c> ScriptedSource<'c> {
    pub fn new(
        clock: &'c ManualClock,
        frames: impl IntoIterator<Item = (u64, Vec<u8>)>,
        gap: Duration,
    ) -> Self {
        Self {
            clock,
            frames: frames.into_iter().collect(),
            gap,
            end: TransportError::Disconnected,
            moves_clock: true,
        }
    }

    #[allow(dead_code)]
    pub fn backlogged(mut self) -> Self {
        self.moves_clock = false;
        self
    }
}

impl FrameSource for ScriptedSource<'_> {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        async_io_mini::Timer::after(self.gap).await;
        match self.frames.pop_front() {
            Some((t, data)) => {
                if self.moves_clock {
                    self.clock.set(t);
                }
                Ok(Frame::new(data, t))
            }
            None => Err(self.end),
        }
    }
}
