//! Pipeline configuration parameters
//!
//! All tunable parameters for the telemetry pipeline.
//! Values can be overridden from a JSON document at startup.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Seconds between the Unix epoch and 2000-01-01, the epoch used by some
/// embedded clocks.  Set as `epoch_offset_secs` when the clock counts from there.
pub const EPOCH_2000_OFFSET_SECS: u64 = 946_684_800;

/// Core pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    // --- Session ---
    /// Continuous zero-speed time (seconds) after which a paused session ends
    pub pause_timeout_secs: u64,
    /// Added to clock readings to obtain Unix seconds (session ids, timestamps)
    pub epoch_offset_secs: u64,

    // --- Timing ---
    /// Snapshot sampling interval while Running (milliseconds)
    pub sample_interval_ms: u32,
    /// Sampler poll interval while not Running (milliseconds)
    pub idle_poll_interval_ms: u32,
    /// Upload cycle interval (milliseconds)
    pub upload_interval_ms: u32,
    /// Wait before the single upload retry (milliseconds)
    pub retry_backoff_ms: u32,

    // --- Upload ---
    /// Maximum snapshots per uploaded batch
    pub batch_size: usize,
    /// Line-protocol measurement name (also the bucket by default)
    pub measurement: String,
    /// Sink host, `host[:port]`
    pub sink_host: String,
    /// Sink bucket
    pub sink_bucket: String,
    /// HTTP request timeout (seconds)
    pub http_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            // Session
            pause_timeout_secs: 180, // 3 min
            epoch_offset_secs: 0,

            // Timing
            sample_interval_ms: 1000,   // 1 Hz
            idle_poll_interval_ms: 500, // 2 Hz
            upload_interval_ms: 5000,   // every 5 s
            retry_backoff_ms: 1000,

            // Upload
            batch_size: crate::telemetry::queue::DEFAULT_QUEUE_CAPACITY,
            measurement: "bike".into(),
            sink_host: "localhost:8086".into(),
            sink_bucket: "bike".into(),
            http_timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.pause_timeout_secs == 0 {
            return Err(Error::Config("pause_timeout_secs must be > 0"));
        }
        if self.sample_interval_ms == 0 || self.idle_poll_interval_ms == 0 {
            return Err(Error::Config("sampler intervals must be > 0"));
        }
        if self.upload_interval_ms < self.sample_interval_ms {
            return Err(Error::Config(
                "upload_interval_ms must be >= sample_interval_ms",
            ));
        }
        if self.retry_backoff_ms >= self.upload_interval_ms {
            return Err(Error::Config(
                "retry_backoff_ms must be < upload_interval_ms",
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be > 0"));
        }
        if !is_line_protocol_name(&self.measurement) {
            return Err(Error::Config(
                "measurement must be non-empty without spaces, commas or '='",
            ));
        }
        if self.sink_host.is_empty() || self.sink_bucket.is_empty() {
            return Err(Error::Config("sink_host and sink_bucket must be set"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.  Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON config"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Config loaded from {}", path.display());
        Ok(cfg)
    }

    /// Sink write endpoint, second-precision timestamps.
    pub fn write_url(&self) -> String {
        format!(
            "http://{}/api/v2/write?bucket={}&precision=s",
            self.sink_host, self.sink_bucket
        )
    }
}

fn is_line_protocol_name(s: &str) -> bool {
    !s.is_empty() && !s.contains([' ', ',', '=', '\n'])
}
