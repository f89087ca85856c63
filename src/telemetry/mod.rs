//! Point-in-time telemetry records and their transport to the sink.
//!
//! A [`TelemetrySnapshot`] is produced once per sampling tick while a
//! session is running, buffered in a [`queue::TelemetryQueue`], drained
//! into a [`Batch`] and encoded with [`line_protocol`].

pub mod line_protocol;
pub mod queue;
pub mod sampler;

use serde::Serialize;

use crate::ftms::MetricKind;
use crate::session::SessionRecord;
use crate::stats::{derive_totals, MetricAggregate};

/// Aggregate state captured at one sampling tick.  Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub session_id: u64,
    pub aggregates: [MetricAggregate; MetricKind::COUNT],
    pub duration_secs: u64,
    pub distance_km: f64,
    pub calories_kcal: f64,
    /// Unix second the snapshot was taken.
    pub captured_at: u64,
}

impl TelemetrySnapshot {
    pub fn aggregate(&self, kind: MetricKind) -> &MetricAggregate {
        &self.aggregates[kind.index()]
    }

    /// Whether a heart-rate strap contributed to this snapshot.
    pub fn has_heart_rate(&self) -> bool {
        self.aggregate(MetricKind::HeartRate).is_present()
    }
}

/// Snapshots drained together for one upload attempt, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    snapshots: Vec<TelemetrySnapshot>,
}

impl Batch {
    pub fn new(snapshots: Vec<TelemetrySnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &[TelemetrySnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Encode as one newline-joined line-protocol payload.
    pub fn encode(&self, measurement: &str) -> String {
        line_protocol::encode_batch(measurement, &self.snapshots)
    }
}

/// Final figures of a session, emitted with the session-closed signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: u64,
    pub active_secs: u64,
    pub paused_secs: u64,
    pub distance_km: f64,
    pub calories_kcal: f64,
    pub aggregates: [MetricAggregate; MetricKind::COUNT],
}

impl SessionSummary {
    /// Summarise a finished record.  The record's `ended_at` freezes the
    /// duration, so `now` only matters for a record that never ended.
    pub fn new(
        record: &SessionRecord,
        aggregates: [MetricAggregate; MetricKind::COUNT],
        now: u64,
    ) -> Self {
        let derived = derive_totals(&aggregates, record.active_secs(now));
        Self {
            session_id: record.id,
            active_secs: derived.duration_secs,
            paused_secs: record.paused_total,
            distance_km: derived.distance_km,
            calories_kcal: derived.calories_kcal,
            aggregates,
        }
    }
}
