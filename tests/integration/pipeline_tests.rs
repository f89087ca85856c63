//! Integration tests for the frame → session → stats → queue → upload chain,
//! driven synchronously through `TelemetryService` and `BatchUploader`.

use futures_lite::future::block_on;

use pedalstream::app::events::AppEvent;
use pedalstream::config::{EPOCH_2000_OFFSET_SECS, TelemetryConfig};
use pedalstream::ftms::MetricKind;
use pedalstream::session::SessionState;
use pedalstream::upload::{BatchUploader, UploadReport};
use pedalstream::TelemetryService;

use crate::mock_io::{MockSink, RecordingEvents, bike_frame, riding, stopped};

fn fast_config() -> TelemetryConfig {
    TelemetryConfig {
        retry_backoff_ms: 1,
        ..TelemetryConfig::default()
    }
}

/// Ride `secs` seconds from `start`, sampling once per second.
fn ride(svc: &mut TelemetryService, ev: &mut RecordingEvents, start: u64, secs: u64, hr: u8) {
    for t in start..start + secs {
        svc.handle_frame(&riding(hr), t, ev).unwrap();
        svc.sample(t, 1000, ev);
    }
}

// ── Upload payload ───────────────────────────────────────────

#[test]
fn ride_uploads_one_line_per_snapshot() {
    let config = fast_config();
    let mut svc = TelemetryService::new(config.clone());
    let mut up = BatchUploader::from_config(&config);
    let mut sink = MockSink::new();
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 0, 10, 0);
    let report = block_on(up.run_cycle(svc.take_batch(), &mut sink, &mut ev));

    assert_eq!(
        report,
        UploadReport::Delivered {
            lines: 10,
            attempts: 1
        }
    );
    let lines: Vec<&str> = sink.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines.iter().all(|l| l.starts_with("bike,id=0 power_max=180,")));
    // No strap: heart-rate fields omitted.
    assert!(lines.iter().all(|l| !l.contains("hr_")));
    assert!(lines[9].ends_with(" 9"));
    assert!(lines[9].contains(",duration=9"));
}

#[test]
fn heart_rate_fields_present_with_strap() {
    let config = fast_config();
    let mut svc = TelemetryService::new(config.clone());
    let mut up = BatchUploader::from_config(&config);
    let mut sink = MockSink::new();
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 0, 3, 142);
    block_on(up.run_cycle(svc.take_batch(), &mut sink, &mut ev));

    assert!(
        sink.lines()
            .all(|l| l.contains(",hr_max=142,hr_last=142,hr_avg=142 "))
    );
}

#[test]
fn session_id_and_timestamps_use_epoch_offset() {
    let config = TelemetryConfig {
        epoch_offset_secs: EPOCH_2000_OFFSET_SECS,
        ..fast_config()
    };
    let mut svc = TelemetryService::new(config);
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 1_000, 1, 0);
    let batch = svc.take_batch();
    let snap = batch.snapshots()[0];
    assert_eq!(snap.session_id, 1_000 + EPOCH_2000_OFFSET_SECS);
    assert_eq!(snap.captured_at, snap.session_id);
}

// ── Failure handling ─────────────────────────────────────────

#[test]
fn double_failure_drops_batch_and_next_cycle_proceeds() {
    let config = fast_config();
    let mut svc = TelemetryService::new(config.clone());
    let mut up = BatchUploader::from_config(&config);
    let mut sink = MockSink::failing(2);
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 0, 5, 0);
    let report = block_on(up.run_cycle(svc.take_batch(), &mut sink, &mut ev));
    assert!(matches!(report, UploadReport::Dropped { lines: 5, .. }));
    assert_eq!(svc.queue_len(), 0);

    ride(&mut svc, &mut ev, 5, 2, 0);
    let report = block_on(up.run_cycle(svc.take_batch(), &mut sink, &mut ev));
    assert_eq!(
        report,
        UploadReport::Delivered {
            lines: 2,
            attempts: 1
        }
    );
    assert_eq!(sink.posted.len(), 3);
    assert_eq!(up.batches_dropped(), 1);
    assert_eq!(up.batches_delivered(), 1);
}

#[test]
fn slow_consumer_loses_oldest_snapshots() {
    let mut svc = TelemetryService::new(fast_config());
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 0, 25, 0);
    assert_eq!(svc.queue_len(), 20);
    assert_eq!(svc.evicted_count(), 5);

    let batch = svc.take_batch();
    let times: Vec<u64> = batch.snapshots().iter().map(|s| s.captured_at).collect();
    assert_eq!(times, (5..25).collect::<Vec<_>>());
}

#[test]
fn garbage_frames_do_not_disturb_session() {
    let mut svc = TelemetryService::new(fast_config());
    let mut ev = RecordingEvents::new();

    svc.handle_frame(&riding(0), 0, &mut ev).unwrap();
    assert!(svc.handle_frame(&[0x44], 1, &mut ev).is_err());
    assert!(svc.handle_frame(&riding(0)[..7], 2, &mut ev).is_err());
    svc.handle_frame(&riding(0), 3, &mut ev).unwrap();

    assert_eq!(svc.state(), SessionState::Running);
    assert_eq!(svc.stats().get(MetricKind::Power).count, 2);
    assert_eq!(svc.decoder().frames_dropped(), 2);
}

// ── Full session ─────────────────────────────────────────────

#[test]
fn full_session_with_pause_resume_and_end() {
    let mut svc = TelemetryService::new(fast_config());
    let mut ev = RecordingEvents::new();

    // 0–599: ride at 25 km/h.
    ride(&mut svc, &mut ev, 0, 600, 0);
    // 600–659: pause for a minute.
    svc.handle_frame(&stopped(), 600, &mut ev).unwrap();
    svc.handle_frame(&stopped(), 630, &mut ev).unwrap();
    // 660–1259: ride again.
    ride(&mut svc, &mut ev, 660, 600, 0);
    // Stop for good.
    svc.handle_frame(&stopped(), 1260, &mut ev).unwrap();
    let summary = svc
        .handle_frame(&stopped(), 1440, &mut ev)
        .unwrap()
        .expect("pause timeout ends the session");

    assert_eq!(summary.session_id, 0);
    assert_eq!(summary.paused_secs, 60 + 180);
    assert_eq!(summary.active_secs, 1200);
    // 25 km/h for 20 minutes.
    assert!((summary.distance_km - 25.0 / 3.0).abs() < 1e-9);
    // 180 W for 1/3 h: 60 Wh × 3.6.
    assert!((summary.calories_kcal - 216.0).abs() < 1e-9);

    let log = ev.snapshot();
    assert_eq!(log.first(), Some(&AppEvent::SessionStarted { id: 0 }));
    assert!(log.contains(&AppEvent::SessionResumed {
        id: 0,
        paused_secs: 60
    }));
    assert!(matches!(log.last(), Some(AppEvent::SessionEnded(_))));

    svc.reset();
    svc.handle_frame(&bike_frame(1000, 120, 90, 0), 2000, &mut ev).unwrap();
    assert_eq!(svc.session_id(), Some(2000));
    assert_eq!(svc.stats().get(MetricKind::Power).max, 90.0);
}

#[test]
fn config_from_json_drives_service() {
    let config = TelemetryConfig::from_json_str(
        r#"{ "pause_timeout_secs": 10, "measurement": "trainer", "batch_size": 2 }"#,
    )
    .unwrap();
    let mut svc = TelemetryService::new(config.clone());
    let mut ev = RecordingEvents::new();

    ride(&mut svc, &mut ev, 0, 3, 0);
    let batch = svc.take_batch();
    assert_eq!(batch.len(), 2);
    assert!(batch.encode(&config.measurement).starts_with("trainer,id=0 "));

    svc.handle_frame(&stopped(), 3, &mut ev).unwrap();
    assert!(svc.handle_frame(&stopped(), 13, &mut ev).unwrap().is_some());
}
