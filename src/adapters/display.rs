//! Status display rendered to the log.
//!
//! The display task redraws twice a second; only changes are logged.

use log::{debug, info};

use crate::app::ports::StatusDisplay;
use crate::ftms::MetricKind;
use crate::telemetry::TelemetrySnapshot;

#[derive(Debug, Default)]
pub struct LogStatusDisplay {
    last_status: String,
}

impl LogStatusDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently rendered status text.
    pub fn last_status(&self) -> &str {
        &self.last_status
    }
}

impl StatusDisplay for LogStatusDisplay {
    fn render_status(&mut self, text: &str) {
        if self.last_status != text {
            info!("STATUS | {}", text);
            self.last_status.clear();
            self.last_status.push_str(text);
        }
    }

    fn render_snapshot(&mut self, snapshot: &TelemetrySnapshot) {
        debug!(
            "SNAPSHOT | id={} t={}s d={:.2}km cal={:.0} W={:.0} rpm={:.0}",
            snapshot.session_id,
            snapshot.duration_secs,
            snapshot.distance_km,
            snapshot.calories_kcal,
            snapshot.aggregate(MetricKind::Power).last,
            snapshot.aggregate(MetricKind::Cadence).last,
        );
    }
}
