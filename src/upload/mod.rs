//! Batch uploader: one attempt, one retry after a fixed backoff, then drop.
//!
//! There is no spooling.  A batch that fails twice is discarded and the
//! failure reported; the next cycle starts clean.

use core::time::Duration;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, TelemetrySink};
use crate::config::TelemetryConfig;
use crate::error::SinkError;
use crate::telemetry::Batch;

/// Attempts per batch: the first post plus one retry.
pub const MAX_ATTEMPTS: u8 = 2;

/// Outcome of one upload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReport {
    /// Nothing was queued.
    Idle,
    /// The sink accepted the batch.
    Delivered { lines: usize, attempts: u8 },
    /// Both attempts failed; the batch is gone.
    Dropped { lines: usize, error: SinkError },
}

/// Encodes batches and posts them with bounded retry.
pub struct BatchUploader {
    measurement: String,
    retry_backoff: Duration,
    batches_delivered: u64,
    batches_dropped: u64,
    lines_dropped: u64,
}

impl BatchUploader {
    pub fn new(measurement: impl Into<String>, retry_backoff: Duration) -> Self {
        Self {
            measurement: measurement.into(),
            retry_backoff,
            batches_delivered: 0,
            batches_dropped: 0,
            lines_dropped: 0,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.measurement.clone(),
            Duration::from_millis(u64::from(config.retry_backoff_ms)),
        )
    }

    /// Ship one batch.  Waits out the backoff on the reactor timer between
    /// attempts, so other tasks keep running.
    pub async fn run_cycle(
        &mut self,
        batch: Batch,
        sink: &mut impl TelemetrySink,
        events: &mut impl EventSink,
    ) -> UploadReport {
        if batch.is_empty() {
            return UploadReport::Idle;
        }

        let lines = batch.len();
        let payload = batch.encode(&self.measurement);

        let mut attempt = 1;
        let error = loop {
            match sink.post(&payload) {
                Ok(()) => {
                    self.batches_delivered += 1;
                    info!("Uploaded {} snapshots (attempt {})", lines, attempt);
                    events.emit(&AppEvent::BatchDelivered {
                        lines,
                        attempts: attempt,
                    });
                    return UploadReport::Delivered {
                        lines,
                        attempts: attempt,
                    };
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Upload failed ({}), retrying in {} ms",
                        e,
                        self.retry_backoff.as_millis()
                    );
                    async_io_mini::Timer::after(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => break e,
            }
        };

        self.batches_dropped += 1;
        self.lines_dropped += lines as u64;
        warn!("Upload retry failed ({}), dropping {} snapshots", error, lines);
        events.emit(&AppEvent::BatchDropped { lines, error });
        UploadReport::Dropped { lines, error }
    }

    pub fn batches_delivered(&self) -> u64 {
        self.batches_delivered
    }

    pub fn batches_dropped(&self) -> u64 {
        self.batches_dropped
    }

    pub fn lines_dropped(&self) -> u64 {
        self.lines_dropped
    }
}
