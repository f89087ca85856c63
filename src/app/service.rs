//! Telemetry service, the hexagonal core.
//!
//! [`TelemetryService`] owns the frame decoder, session tracker, statistics
//! aggregator and snapshot queue.  It is the only place those are mutated.
//! All I/O flows through port traits passed in at call sites, so the whole
//! pipeline is testable with mock adapters.
//!
//! ```text
//!  frame bytes ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │       TelemetryService       │
//!                  │ Decoder · Tracker · Stats ·  │ ──▶ Batch ──▶ uploader
//!                  │           Queue              │
//!                  └──────────────────────────────┘
//! ```

use core::fmt::Write;
use core::time::Duration;

use log::{info, warn};

use crate::config::TelemetryConfig;
use crate::error::DecodeError;
use crate::ftms::{FrameDecoder, MetricKind};
use crate::session::{SessionRecord, SessionState, SessionTracker, Transition};
use crate::stats::StatsAggregator;
use crate::telemetry::queue::TelemetryQueue;
use crate::telemetry::sampler::Sampler;
use crate::telemetry::{Batch, SessionSummary, TelemetrySnapshot};

use super::events::AppEvent;
use super::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// TelemetryService
// ───────────────────────────────────────────────────────────────

/// Single owner of all mutable pipeline state.
pub struct TelemetryService {
    config: TelemetryConfig,
    decoder: FrameDecoder,
    tracker: SessionTracker,
    stats: StatsAggregator,
    queue: TelemetryQueue,
    sampler: Sampler,
}

impl TelemetryService {
    /// Construct the service.  `config` is assumed validated.
    pub fn new(config: TelemetryConfig) -> Self {
        let tracker = SessionTracker::new(config.pause_timeout_secs, config.epoch_offset_secs);
        let sampler = Sampler::from_config(&config);
        Self {
            config,
            decoder: FrameDecoder::new(),
            tracker,
            stats: StatsAggregator::new(),
            queue: TelemetryQueue::new(),
            sampler,
        }
    }

    // ── Frame path ────────────────────────────────────────────

    /// Decode one frame, advance the session and fold its readings in.
    ///
    /// Returns the session summary when this frame ended the session.  A
    /// malformed frame is reported and dropped with no state change.
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        now: u64,
        sink: &mut impl EventSink,
    ) -> Result<Option<SessionSummary>, DecodeError> {
        let decoded = match self.decoder.decode(frame) {
            Ok(d) => d,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                sink.emit(&AppEvent::FrameDropped(e));
                return Err(e);
            }
        };

        let aggregate = match decoded.speed_kmh() {
            Some(speed) => {
                let transition = self.tracker.observe(speed, now);
                if let Some(summary) = self.report(transition, now, sink) {
                    return Ok(Some(summary));
                }
                transition.aggregates()
            }
            // No speed field: the reading cannot move the session, but its
            // other metrics count while a session is running.
            None => self.tracker.state() == SessionState::Running,
        };

        if aggregate {
            for reading in &decoded.readings {
                self.stats.update(reading.kind, reading.value());
            }
        }
        Ok(None)
    }

    fn report(
        &self,
        transition: Transition,
        now: u64,
        sink: &mut impl EventSink,
    ) -> Option<SessionSummary> {
        let id = self.session_id().unwrap_or(0);
        match transition {
            Transition::Started { id } => sink.emit(&AppEvent::SessionStarted { id }),
            Transition::Paused => sink.emit(&AppEvent::SessionPaused { id }),
            Transition::Resumed { paused_secs } => {
                sink.emit(&AppEvent::SessionResumed { id, paused_secs })
            }
            Transition::Ended(record) => {
                let summary = SessionSummary::new(&record, self.stats.aggregates(), now);
                sink.emit(&AppEvent::SessionEnded(summary));
                return Some(summary);
            }
            Transition::Discarded
            | Transition::Accepted
            | Transition::StillPaused { .. }
            | Transition::Ignored => {}
        }
        None
    }

    // ── Sampling ──────────────────────────────────────────────

    /// Advance the sampler by `delta_ms`; enqueue a snapshot if one is due.
    pub fn sample(
        &mut self,
        now: u64,
        delta_ms: u32,
        sink: &mut impl EventSink,
    ) -> Option<TelemetrySnapshot> {
        let running = self.tracker.state() == SessionState::Running;
        if !self.sampler.tick(delta_ms, running) {
            return None;
        }
        let snapshot = self.current_snapshot(now)?;
        if let Some(old) = self.queue.push(snapshot) {
            sink.emit(&AppEvent::SnapshotEvicted {
                session_id: old.session_id,
                captured_at: old.captured_at,
            });
        }
        Some(snapshot)
    }

    /// How long the sampler task should sleep before its next tick.
    pub fn sample_delay(&self) -> Duration {
        self.sampler
            .next_delay(self.tracker.state() == SessionState::Running)
    }

    /// The live aggregates as a snapshot, without enqueuing it.
    pub fn current_snapshot(&self, now: u64) -> Option<TelemetrySnapshot> {
        let record = self.tracker.record()?;
        Some(
            self.stats
                .snapshot(record, now, self.config.epoch_offset_secs),
        )
    }

    // ── Upload hand-off ───────────────────────────────────────

    /// Drain up to `batch_size` snapshots, oldest first.
    pub fn take_batch(&mut self) -> Batch {
        Batch::new(self.queue.drain(self.config.batch_size))
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Return tracker, aggregates and queue to their initial state.
    /// Invoked by the consumer of [`AppEvent::SessionEnded`].
    pub fn reset(&mut self) {
        let closed = self.session_id();
        self.tracker.reset();
        self.stats.reset();
        self.queue.clear();
        match closed {
            Some(id) => info!("Pipeline reset after session {}", id),
            None => info!("Pipeline reset"),
        }
    }

    /// The frame source reconnected; the next frame may use new flags.
    pub fn on_reconnect(&mut self) {
        self.decoder.reset();
    }

    // ── Status ────────────────────────────────────────────────

    /// One-line human-readable status for displays and consoles.
    pub fn status_line(&self, now: u64) -> String {
        match self.tracker.state() {
            SessionState::NotStarted => "Not started".into(),
            SessionState::Paused => "Session paused".into(),
            SessionState::Ended => "Session ended".into(),
            SessionState::Running => self.live_line(now),
        }
    }

    fn live_line(&self, now: u64) -> String {
        let cadence = self.stats.get(MetricKind::Cadence);
        let speed = self.stats.get(MetricKind::Speed);
        let hr = self.stats.get(MetricKind::HeartRate);
        let power = self.stats.get(MetricKind::Power);
        let derived = self
            .tracker
            .record()
            .map(|r| self.stats.derive(r, now))
            .unwrap_or_default();

        let mut line = String::with_capacity(96);
        let _ = write!(
            line,
            "RPM {:.0} Rm {:.0} | S {:.0} Sa {:.0} | ",
            cadence.last, cadence.max, speed.last, speed.avg
        );
        if hr.is_present() {
            let _ = write!(line, "Hc {:.0} Hm {:.0} | ", hr.last, hr.max);
        }
        let _ = write!(
            line,
            "Wc {:.0} Wm {:.0} Wa {:.0} | Cal {:.0} T {} D {:.1}",
            power.last,
            power.max,
            power.avg,
            derived.calories_kcal,
            derived.duration_secs,
            derived.distance_km
        );
        line
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.tracker.state()
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.tracker.record()
    }

    pub fn session_id(&self) -> Option<u64> {
        self.tracker.record().map(|r| r.id)
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn evicted_count(&self) -> u64 {
        self.queue.evicted_count()
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}
