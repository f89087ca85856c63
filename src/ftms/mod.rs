//! Fitness Machine Service "Indoor Bike Data" frames.
//!
//! ```text
//! ┌────────────┬───────────┬───────────┬─────┬───────────┐
//! │ Flags (2B) │ field a   │ field b   │ ... │ field n   │
//! │ LE u16     │ (bit ord) │ (bit ord) │     │ (bit ord) │
//! └────────────┴───────────┴───────────┴─────┴───────────┘
//! ```
//!
//! Each flag bit declares whether one optional field follows.  Fields are
//! densely packed, little-endian, in ascending bit order.  Bit 0 is
//! inverted: when it is **clear** the instantaneous speed is present.
//!
//! Only four fields become [`MetricReading`]s (speed, cadence, power, heart
//! rate); the others are measured so the offsets of later fields stay right.

pub mod decoder;

pub use decoder::{DecodedFrame, FrameDecoder};

/// Units of the raw instantaneous speed field: 0.01 km/h.
pub const SPEED_RAW_PER_KMH: f64 = 100.0;

/// Units of the raw instantaneous cadence field: 0.5 rpm.
pub const CADENCE_RAW_PER_RPM: f64 = 2.0;

// ---------------------------------------------------------------------------
// Metric identity
// ---------------------------------------------------------------------------

/// The four metrics the pipeline aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MetricKind {
    Power = 0,
    Speed = 1,
    Cadence = 2,
    HeartRate = 3,
}

impl MetricKind {
    /// Total number of kinds, used to size per-kind arrays.
    pub const COUNT: usize = 4;

    /// Every kind, in array order.
    pub const ALL: [MetricKind; Self::COUNT] = [
        MetricKind::Power,
        MetricKind::Speed,
        MetricKind::Cadence,
        MetricKind::HeartRate,
    ];

    /// Position in per-kind arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field-name prefix in the upload payload.
    pub const fn field_prefix(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Speed => "speed",
            Self::Cadence => "cadence",
            Self::HeartRate => "hr",
        }
    }
}

/// One decoded metric value from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricReading {
    pub kind: MetricKind,
    /// Raw wire value (sign-extended for power).
    pub raw: i32,
    /// Position of this reading within its frame.
    pub order: u8,
}

impl MetricReading {
    /// Value in aggregation units: km/h, rpm, watts, bpm.
    pub fn value(&self) -> f64 {
        match self.kind {
            MetricKind::Speed => f64::from(self.raw) / SPEED_RAW_PER_KMH,
            MetricKind::Cadence => f64::from(self.raw) / CADENCE_RAW_PER_RPM,
            MetricKind::Power | MetricKind::HeartRate => f64::from(self.raw),
        }
    }
}

// ---------------------------------------------------------------------------
// Flag table
// ---------------------------------------------------------------------------

/// Every field an Indoor Bike Data frame can carry, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    InstantaneousSpeed,
    AverageSpeed,
    InstantaneousCadence,
    AverageCadence,
    TotalDistance,
    ResistanceLevel,
    InstantaneousPower,
    AveragePower,
    ExpendedEnergy,
    HeartRate,
    MetabolicEquivalent,
    ElapsedTime,
    RemainingTime,
}

impl Field {
    /// Wire order.  Index `i` is governed by flag bit `i`.
    pub const ORDER: [Field; 13] = [
        Field::InstantaneousSpeed,
        Field::AverageSpeed,
        Field::InstantaneousCadence,
        Field::AverageCadence,
        Field::TotalDistance,
        Field::ResistanceLevel,
        Field::InstantaneousPower,
        Field::AveragePower,
        Field::ExpendedEnergy,
        Field::HeartRate,
        Field::MetabolicEquivalent,
        Field::ElapsedTime,
        Field::RemainingTime,
    ];

    /// Flag bit mask for this field.
    pub const fn mask(self) -> u16 {
        1 << (self as u16)
    }

    /// Whether `flags` declares this field present.
    pub const fn present_in(self, flags: u16) -> bool {
        match self {
            // "More Data" bit: speed is present when the bit is clear.
            Self::InstantaneousSpeed => flags & self.mask() == 0,
            _ => flags & self.mask() != 0,
        }
    }

    /// Size on the wire in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::HeartRate | Self::MetabolicEquivalent => 1,
            Self::TotalDistance => 3,
            // Total energy u16, energy per hour u16, energy per minute u8.
            Self::ExpendedEnergy => 5,
            _ => 2,
        }
    }

    /// The aggregated metric this field feeds, if any.
    pub const fn metric(self) -> Option<MetricKind> {
        match self {
            Self::InstantaneousSpeed => Some(MetricKind::Speed),
            Self::InstantaneousCadence => Some(MetricKind::Cadence),
            Self::InstantaneousPower => Some(MetricKind::Power),
            Self::HeartRate => Some(MetricKind::HeartRate),
            _ => None,
        }
    }

    /// Read this field's raw value from exactly `width()` bytes.
    fn read_raw(self, bytes: &[u8]) -> i32 {
        match self {
            Self::InstantaneousPower => i32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            Self::HeartRate => i32::from(bytes[0]),
            _ => i32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
        }
    }
}

/// Field layout implied by one flags value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub flags: u16,
    pub fields: heapless::Vec<Field, 13>,
    /// Total bytes after the flags.
    pub payload_len: usize,
}

impl FieldLayout {
    /// Derive the layout from a flags value.  Reserved bits 13–15 carry no fields.
    pub fn from_flags(flags: u16) -> Self {
        let mut fields = heapless::Vec::new();
        let mut payload_len = 0;
        for field in Field::ORDER {
            if field.present_in(flags) {
                // ORDER has exactly the vector's capacity.
                let _ = fields.push(field);
                payload_len += field.width();
            }
        }
        Self {
            flags,
            fields,
            payload_len,
        }
    }

    /// Whether any field feeding a metric is present.
    pub fn has_metric(&self, kind: MetricKind) -> bool {
        self.fields.iter().any(|f| f.metric() == Some(kind))
    }
}
