//! Running per-metric statistics and derived session totals.
//!
//! One [`MetricAggregate`] per [`MetricKind`], stored in a fixed array
//! indexed by kind.  Duration, distance and calories are never stored:
//! they are recomputed from the aggregates and the session record every
//! time someone asks.

use serde::Serialize;

use crate::ftms::MetricKind;
use crate::session::SessionRecord;
use crate::telemetry::TelemetrySnapshot;

/// Seconds per hour.
const SECS_PER_HOUR: f64 = 3600.0;

/// energy (kcal) = avg power (W) × hours × 3.6
const KCAL_PER_WATT_HOUR: f64 = 3.6;

/// Running statistics for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricAggregate {
    pub max: f64,
    pub avg: f64,
    pub last: f64,
    pub count: u32,
}

impl MetricAggregate {
    /// Fold one accepted value in.
    fn accept(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        // Incremental form of (avg*count + value)/(count+1); a run of equal
        // values leaves avg bit-identical to that value.
        self.avg += (value - self.avg) / f64::from(self.count + 1);
        self.last = value;
        self.count += 1;
    }

    /// Whether any value has been accepted.
    pub fn is_present(&self) -> bool {
        self.count > 0
    }
}

/// Totals derived from the aggregates at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Derived {
    /// Active (unpaused) seconds since the session started.
    pub duration_secs: u64,
    /// avg speed (km/h) × hours.
    pub distance_km: f64,
    /// avg power (W) × hours × 3.6.
    pub calories_kcal: f64,
}

/// Per-kind running statistics for the live session.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    aggregates: [MetricAggregate; MetricKind::COUNT],
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a value in.  Returns `false` if it was rejected.
    ///
    /// Rejected: non-finite values, and heart rate ≤ 0 (the sensor sends 0
    /// when no strap is paired).
    pub fn update(&mut self, kind: MetricKind, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if kind == MetricKind::HeartRate && value <= 0.0 {
            return false;
        }
        self.aggregates[kind.index()].accept(value);
        true
    }

    pub fn get(&self, kind: MetricKind) -> &MetricAggregate {
        &self.aggregates[kind.index()]
    }

    pub fn aggregates(&self) -> [MetricAggregate; MetricKind::COUNT] {
        self.aggregates
    }

    /// Duration, distance and calories for `record` as of `now`.
    pub fn derive(&self, record: &SessionRecord, now: u64) -> Derived {
        derive_totals(&self.aggregates, record.active_secs(now))
    }

    /// Capture the current aggregates for `record` at clock second `now`.
    pub fn snapshot(
        &self,
        record: &SessionRecord,
        now: u64,
        epoch_offset_secs: u64,
    ) -> TelemetrySnapshot {
        let derived = self.derive(record, now);
        TelemetrySnapshot {
            session_id: record.id,
            aggregates: self.aggregates,
            duration_secs: derived.duration_secs,
            distance_km: derived.distance_km,
            calories_kcal: derived.calories_kcal,
            captured_at: now + epoch_offset_secs,
        }
    }

    /// Zero everything (new session).
    pub fn reset(&mut self) {
        self.aggregates = [MetricAggregate::default(); MetricKind::COUNT];
    }
}

/// Derived totals for a given set of aggregates and active duration.
pub fn derive_totals(
    aggregates: &[MetricAggregate; MetricKind::COUNT],
    duration_secs: u64,
) -> Derived {
    let hours = duration_secs as f64 / SECS_PER_HOUR;
    Derived {
        duration_secs,
        distance_km: aggregates[MetricKind::Speed.index()].avg * hours,
        calories_kcal: aggregates[MetricKind::Power.index()].avg * hours * KCAL_PER_WATT_HOUR,
    }
}
