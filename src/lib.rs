//! Indoor bike telemetry pipeline.
//!
//! Decodes Fitness Machine Service Indoor Bike Data frames, derives the
//! workout session from the speed reading, keeps running statistics and
//! ships periodic snapshots to a line-protocol sink with one retry.
//!
//! ```text
//!  FrameSource ─▶ ftms ─▶ session ─▶ stats ─▶ telemetry::queue ─▶ upload ─▶ TelemetrySink
//! ```
//!
//! Transports, displays, HTTP and clocks are reached only through the
//! port traits in [`app::ports`].  No logger backend is installed here;
//! the host binary picks one for the `log` facade.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod ftms;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod telemetry;
pub mod upload;

pub use app::service::TelemetryService;
pub use config::TelemetryConfig;
pub use error::{Error, Result};
pub use runtime::Pipeline;
