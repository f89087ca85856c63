//! Integration tests for the cooperative runtime: real executor, real
//! reactor timers, scripted frame source and a manual clock.
//!
//! Intervals are shrunk to milliseconds so a whole ride replays quickly.

use std::time::Duration;

use pedalstream::adapters::time::ManualClock;
use pedalstream::app::events::AppEvent;
use pedalstream::config::TelemetryConfig;
use pedalstream::error::TransportError;
use pedalstream::session::SessionState;
use pedalstream::Pipeline;

use crate::mock_io::{MockSink, RecordingDisplay, RecordingEvents, ScriptedSource, riding, stopped};

fn quick_config() -> TelemetryConfig {
    TelemetryConfig {
        sample_interval_ms: 5,
        idle_poll_interval_ms: 2,
        upload_interval_ms: 20,
        retry_backoff_ms: 5,
        ..TelemetryConfig::default()
    }
}

fn pipeline(
    sink: MockSink,
    events: RecordingEvents,
) -> Pipeline<MockSink, RecordingDisplay, RecordingEvents> {
    let config = quick_config();
    config.validate().unwrap();
    Pipeline::new(config, sink, RecordingDisplay::default(), events)
        .with_display_interval(Duration::from_millis(3))
}

#[test]
fn returns_transport_error_and_clears_layout() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::new(), events.clone());
    let mut source = ScriptedSource::new(&clock, [(0, riding(0))], Duration::from_millis(2));

    let err = p.run_until_disconnect(&mut source, &clock);

    assert_eq!(err, TransportError::Disconnected);
    assert_eq!(p.service().decoder().current_flags(), None);
    assert_eq!(p.service().decoder().frames_decoded(), 1);
    assert_eq!(
        events.snapshot().last(),
        Some(&AppEvent::TransportLost(TransportError::Disconnected))
    );
}

#[test]
fn uploads_while_riding() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::new(), events.clone());
    let frames = (0..40).map(|t| (t, riding(0)));
    let mut source = ScriptedSource::new(&clock, frames, Duration::from_millis(5));

    p.run_until_disconnect(&mut source, &clock);

    let sink = p.sink();
    assert!(!sink.posted.is_empty(), "at least one batch should be posted");
    assert!(sink.lines().all(|l| l.starts_with("bike,id=0 ")));
    assert!(p.uploader().batches_delivered() >= 1);
    assert!(
        events
            .snapshot()
            .iter()
            .any(|e| matches!(e, AppEvent::BatchDelivered { .. }))
    );
    assert!(p.display().snapshots > 0);
}

#[test]
fn lifecycle_task_resets_after_session_end() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::new(), events.clone());
    let frames = [
        (0, riding(0)),
        (1, riding(0)),
        (2, stopped()),
        (182, stopped()),
        (200, riding(0)),
    ];
    let mut source = ScriptedSource::new(&clock, frames, Duration::from_millis(10));

    p.run_until_disconnect(&mut source, &clock);

    assert_eq!(p.service().state(), SessionState::Running);
    assert_eq!(p.service().session_id(), Some(200));

    let log = events.snapshot();
    let ended = log.iter().find_map(|e| match e {
        AppEvent::SessionEnded(s) => Some(*s),
        _ => None,
    });
    let summary = ended.expect("first session should end");
    assert_eq!(summary.session_id, 0);
    assert_eq!(summary.paused_secs, 180);
    assert!(log.contains(&AppEvent::SessionStarted { id: 200 }));

    let statuses = &p.display().statuses;
    assert!(statuses.iter().any(|s| s == "Session paused"));
}

#[test]
fn failing_sink_never_stops_the_pipeline() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::failing(usize::MAX), events.clone());
    let frames = (0..30).map(|t| (t, riding(0)));
    let mut source = ScriptedSource::new(&clock, frames, Duration::from_millis(5));

    let err = p.run_until_disconnect(&mut source, &clock);

    assert_eq!(err, TransportError::Disconnected);
    assert_eq!(p.service().decoder().frames_decoded(), 30);
    assert_eq!(p.uploader().batches_delivered(), 0);
    assert!(p.uploader().batches_dropped() >= 1);
}

#[test]
fn reconnects_resume_the_session_and_release_every_task() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::new(), events.clone());

    for run in 0..5u64 {
        let frames = (0..4).map(|i| (run * 10 + i, riding(0)));
        let mut source = ScriptedSource::new(&clock, frames, Duration::from_millis(3));

        assert_eq!(
            p.run_until_disconnect(&mut source, &clock),
            TransportError::Disconnected
        );
        assert_eq!(p.service_handles(), 1, "tasks outlived run {run}");
    }

    assert_eq!(p.service().state(), SessionState::Running);
    assert_eq!(p.service().session_id(), Some(0));
    assert_eq!(p.service().decoder().frames_decoded(), 20);

    let log = events.snapshot();
    let started = log
        .iter()
        .filter(|e| matches!(e, AppEvent::SessionStarted { .. }))
        .count();
    let lost = log
        .iter()
        .filter(|e| matches!(e, AppEvent::TransportLost(_)))
        .count();
    assert_eq!(started, 1);
    assert_eq!(lost, 5);
}

#[test]
fn disconnect_during_backoff_still_retries_and_reports() {
    let clock = ManualClock::new(0);
    let events = RecordingEvents::new();
    let config = TelemetryConfig {
        upload_interval_ms: 60,
        retry_backoff_ms: 50,
        ..quick_config()
    };
    config.validate().unwrap();
    let mut p = Pipeline::new(
        config,
        MockSink::failing(usize::MAX),
        RecordingDisplay::default(),
        events.clone(),
    )
    .with_display_interval(Duration::from_millis(3));

    // First post fails at ~60 ms; the source fails at ~85 ms, midway
    // through the 50 ms backoff.
    let frames = (0..16).map(|t| (t, riding(0)));
    let mut source = ScriptedSource::new(&clock, frames, Duration::from_millis(5));

    let err = p.run_until_disconnect(&mut source, &clock);

    assert_eq!(err, TransportError::Disconnected);
    assert_eq!(p.sink().posted.len(), 2);
    assert_eq!(p.sink().posted[0], p.sink().posted[1]);
    assert_eq!(p.uploader().batches_dropped(), 1);
    assert_eq!(p.uploader().batches_delivered(), 0);
    assert!(
        events
            .snapshot()
            .iter()
            .any(|e| matches!(e, AppEvent::BatchDropped { .. }))
    );
    assert_eq!(p.service_handles(), 1);
}

#[test]
fn pause_timing_follows_frame_arrival() {
    // Processing happens at t=286, but the frames arrived between 90 and
    // 271: the zero-speed run lasted 171 s, short of the 180 s timeout.
    let clock = ManualClock::new(286);
    let events = RecordingEvents::new();
    let mut p = pipeline(MockSink::new(), events.clone());
    let mut frames = vec![(90, riding(0)), (100, stopped())];
    frames.extend((265..=270).map(|t| (t, stopped())));
    frames.push((271, riding(0)));
    let mut source =
        ScriptedSource::new(&clock, frames, Duration::from_millis(2)).backlogged();

    p.run_until_disconnect(&mut source, &clock);

    assert_eq!(p.service().state(), SessionState::Running);
    assert_eq!(p.service().session_id(), Some(90));

    let log = events.snapshot();
    assert!(!log.iter().any(|e| matches!(e, AppEvent::SessionEnded(_))));
    assert!(log.contains(&AppEvent::SessionResumed {
        id: 90,
        paused_secs: 171
    }));
}
