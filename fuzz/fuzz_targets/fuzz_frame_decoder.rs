//! Fuzz target: `FrameDecoder::decode`
//!
//! Drives arbitrary byte sequences through the Indoor Bike Data decoder as
//! a stream of notifications and asserts that it never panics, never yields
//! more readings than there are metric kinds, and that a failed frame never
//! disturbs the cached layout.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use pedalstream::ftms::{FrameDecoder, MetricKind};

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    // First byte picks the notification size; the rest is split into frames.
    let Some((&chunk, rest)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk % 32).max(1);

    for frame in rest.chunks(chunk) {
        let before = decoder.current_flags();
        match decoder.decode(frame) {
            Ok(decoded) => {
                assert!(decoded.readings.len() <= MetricKind::COUNT);
                assert_eq!(decoder.current_flags(), Some(decoded.flags));
                for reading in &decoded.readings {
                    assert!(reading.value().is_finite());
                }
            }
            Err(_) => assert_eq!(decoder.current_flags(), before),
        }
    }

    // Whole input as one frame, after a reset.
    decoder.reset();
    let _ = decoder.decode(rest);
});
