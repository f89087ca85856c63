//! Line-protocol encoding of snapshots.
//!
//! ```text
//! bike,id=946685800 power_max=210,power_last=180,...,duration=42 946685842
//! ```
//!
//! Heart-rate fields are appended only when the snapshot's heart-rate
//! aggregate has at least one accepted value.

use core::fmt::Write;

use super::TelemetrySnapshot;
use crate::ftms::MetricKind;

/// Always-present metrics, in field order.
const CORE_METRICS: [MetricKind; 3] = [MetricKind::Power, MetricKind::Cadence, MetricKind::Speed];

/// Append one line (no trailing newline) for `snap` to `out`.
pub fn encode_line(out: &mut String, measurement: &str, snap: &TelemetrySnapshot) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{measurement},id={} ", snap.session_id);

    for kind in CORE_METRICS {
        write_aggregate(out, kind, snap);
        out.push(',');
    }

    let _ = write!(
        out,
        "distance={},calories={},duration={}",
        snap.distance_km, snap.calories_kcal, snap.duration_secs
    );

    if snap.has_heart_rate() {
        out.push(',');
        write_aggregate(out, MetricKind::HeartRate, snap);
    }

    let _ = write!(out, " {}", snap.captured_at);
}

/// Encode all snapshots, one line each, joined by `\n`.
pub fn encode_batch(measurement: &str, snapshots: &[TelemetrySnapshot]) -> String {
    let mut out = String::with_capacity(snapshots.len() * 256);
    for (i, snap) in snapshots.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        encode_line(&mut out, measurement, snap);
    }
    out
}

fn write_aggregate(out: &mut String, kind: MetricKind, snap: &TelemetrySnapshot) {
    let agg = snap.aggregate(kind);
    let p = kind.field_prefix();
    let _ = write!(
        out,
        "{p}_max={},{p}_last={},{p}_avg={}",
        agg.max, agg.last, agg.avg
    );
}
