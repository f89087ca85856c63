//! Indoor Bike Data frame decoder.
//!
//! The sensor repeats the same flags value on every notification of a
//! connection, so the derived [`FieldLayout`] is cached and reused.  A
//! frame carrying a different flags value re-derives the layout; the cache
//! is never applied to a frame whose flags it was not built from.
//!
//! A malformed frame yields a [`DecodeError`] and leaves the cache as it
//! was, so one bad notification cannot poison the next.

use log::{debug, info};

use super::{FieldLayout, MetricKind, MetricReading};
use crate::error::DecodeError;

/// Flags field size.
const FLAGS_SIZE: usize = 2;

/// Readings decoded from one frame, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub flags: u16,
    pub readings: heapless::Vec<MetricReading, { MetricKind::COUNT }>,
}

impl DecodedFrame {
    /// The reading for `kind`, if the frame carried that field.
    pub fn get(&self, kind: MetricKind) -> Option<&MetricReading> {
        self.readings.iter().find(|r| r.kind == kind)
    }

    /// Instantaneous speed in km/h, if present.  Drives the session tracker.
    pub fn speed_kmh(&self) -> Option<f64> {
        self.get(MetricKind::Speed).map(MetricReading::value)
    }
}

/// Per-connection frame decoder.
pub struct FrameDecoder {
    layout: Option<FieldLayout>,
    frames_decoded: u64,
    frames_dropped: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            layout: None,
            frames_decoded: 0,
            frames_dropped: 0,
        }
    }

    /// Decode one complete frame.
    pub fn decode(&mut self, frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
        let result = self.decode_inner(frame);
        match result {
            Ok(_) => self.frames_decoded += 1,
            Err(_) => self.frames_dropped += 1,
        }
        result
    }

    fn decode_inner(&mut self, frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
        if frame.len() < FLAGS_SIZE {
            return Err(DecodeError::MissingFlags);
        }
        let flags = u16::from_le_bytes([frame[0], frame[1]]);

        let fresh;
        let layout = match &self.layout {
            Some(cached) if cached.flags == flags => cached,
            _ => {
                fresh = FieldLayout::from_flags(flags);
                &fresh
            }
        };

        let expected = FLAGS_SIZE + layout.payload_len;
        if frame.len() < expected {
            return Err(DecodeError::ShortFrame {
                needed: expected,
                got: frame.len(),
            });
        }
        if frame.len() > expected {
            return Err(DecodeError::TrailingBytes {
                expected,
                got: frame.len(),
            });
        }

        let mut readings = heapless::Vec::new();
        let mut offset = FLAGS_SIZE;
        for field in &layout.fields {
            let width = field.width();
            if let Some(kind) = field.metric() {
                let reading = MetricReading {
                    kind,
                    raw: field.read_raw(&frame[offset..offset + width]),
                    order: readings.len() as u8,
                };
                // At most one field per kind, so capacity is never exceeded.
                let _ = readings.push(reading);
            }
            offset += width;
        }

        if self.layout.as_ref().map(|l| l.flags) != Some(flags) {
            match &self.layout {
                Some(old) => info!(
                    "FTMS layout changed: flags 0x{:04x} -> 0x{:04x}, re-deriving",
                    old.flags, flags
                ),
                None => debug!("FTMS layout: flags 0x{:04x}, {} payload bytes", flags, expected - FLAGS_SIZE),
            }
            self.layout = Some(FieldLayout::from_flags(flags));
        }

        Ok(DecodedFrame { flags, readings })
    }

    /// Forget the cached layout (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.layout = None;
    }

    /// Flags of the cached layout, if any frame has been decoded.
    pub fn current_flags(&self) -> Option<u16> {
        self.layout.as_ref().map(|l| l.flags)
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
