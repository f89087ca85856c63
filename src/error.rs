//! Error types for the telemetry pipeline.
//!
//! Each subsystem has its own small `Copy` error so it can be carried inside
//! [`AppEvent`](crate::app::events::AppEvent)s and upload reports without
//! allocation.  [`Error`] covers crate-level setup failures.
//!
//! None of the runtime errors are fatal: decode errors drop one frame, sink
//! errors drop one batch, transport errors are handed back to whoever owns
//! reconnects.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Setup errors surfaced before the pipeline starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// A frame was malformed.  The frame is discarded; no state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than two bytes: the flags field itself is missing.
    MissingFlags,
    /// The flags claim more field bytes than the frame carries.
    ShortFrame { needed: usize, got: usize },
    /// The frame carries bytes beyond the fields the flags declare.
    TrailingBytes { expected: usize, got: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFlags => write!(f, "frame shorter than flags field"),
            Self::ShortFrame { needed, got } => {
                write!(f, "short frame: flags need {needed} bytes, got {got}")
            }
            Self::TrailingBytes { expected, got } => {
                write!(f, "trailing bytes: flags declare {expected} bytes, got {got}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The sensor link dropped.
    Disconnected,
    /// No frame arrived within the transport's own deadline.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "sensor disconnected"),
            Self::Timeout => write!(f, "sensor timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The request never completed (DNS, connect, reset, timeout).
    Unreachable,
    /// The sink answered with a non-success HTTP status.
    Rejected(u16),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "sink unreachable"),
            Self::Rejected(status) => write!(f, "sink rejected batch (HTTP {status})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
