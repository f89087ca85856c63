//! Application core: pipeline orchestration, zero I/O.
//!
//! [`service::TelemetryService`] owns the decoder, session tracker,
//! aggregator and queue.  All interaction with transports, sinks and
//! displays happens through the **port traits** defined in [`ports`],
//! keeping this layer fully testable without hardware or network.

pub mod events;
pub mod ports;
pub mod service;
