//! Cooperative pipeline runtime: one thread, five tasks.
//!
//! Uses `edge-executor` for cooperative scheduling and `async-io-mini`
//! reactor timers (no busy-spinning).  All tasks share one
//! [`TelemetryService`] through `Rc<RefCell<_>>`; a borrow never spans an
//! `.await`, so each task's mutation is atomic with respect to the others.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::future::block_on                              │
//!  │  ┌────────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                          │  │
//!  │  │                                                        │  │
//!  │  │  ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌─────────────┐  │  │
//!  │  │  │ Decode   │ │ Sampler │ │ Upload  │ │ Display     │  │  │
//!  │  │  │ on frame │ │ 1s/0.5s │ │ 5s ⏱   │ │ 0.5s ⏱     │  │  │
//!  │  │  └────┬─────┘ └─────────┘ └─────────┘ └─────────────┘  │  │
//!  │  │       │ SessionSummary (channel, depth 1)              │  │
//!  │  │       ▼                                                │  │
//!  │  │  ┌───────────┐                                         │  │
//!  │  │  │ Lifecycle │ resets the service                      │  │
//!  │  │  └───────────┘                                         │  │
//!  │  └────────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decode task ends when the frame source fails; that error is handed
//! back to the caller, which owns reconnect policy.  Before returning, an
//! upload cycle already in flight runs to completion (retry included) and
//! every other task is cancelled, so nothing outlives the call.  Session
//! state lives in the [`Pipeline`] and survives reconnects.

use core::cell::{Ref, RefCell};
use core::time::Duration;
use std::rc::Rc;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, FrameSource, StatusDisplay, TelemetrySink};
use crate::app::service::TelemetryService;
use crate::config::TelemetryConfig;
use crate::error::TransportError;
use crate::session::SessionState;
use crate::telemetry::SessionSummary;
use crate::upload::BatchUploader;

/// Executor task slots.
const MAX_TASKS: usize = 8;

/// Default display refresh period.
pub const DISPLAY_INTERVAL: Duration = Duration::from_millis(500);

type SharedService = Rc<RefCell<TelemetryService>>;

/// Carries the session-closed signal from the decode task to the lifecycle task.
type ClosedChannel = Channel<NoopRawMutex, SessionSummary, 1>;

/// Raised once the frame source has failed.
type StopSignal = Signal<NoopRawMutex, ()>;

// ── Shared event sink ────────────────────────────────────────

/// Clonable handle to one event sink.  Borrows only inside `emit`, so the
/// uploader can hold it across its backoff await.
pub struct SharedEvents<E>(Rc<RefCell<E>>);

impl<E> SharedEvents<E> {
    pub fn new(sink: E) -> Self {
        Self(Rc::new(RefCell::new(sink)))
    }

    pub fn borrow(&self) -> Ref<'_, E> {
        self.0.borrow()
    }
}

impl<E> Clone for SharedEvents<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E: EventSink> EventSink for SharedEvents<E> {
    fn emit(&mut self, event: &AppEvent) {
        self.0.borrow_mut().emit(event);
    }
}

// ── Tasks ────────────────────────────────────────────────────

/// Decode task: wakes on each frame and runs decode → session → aggregate.
async fn decode_loop<F: FrameSource, E: EventSink>(
    service: SharedService,
    source: &mut F,
    closed: &ClosedChannel,
    mut events: SharedEvents<E>,
) -> TransportError {
    loop {
        let frame = match source.next_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame source failed: {}", e);
                events.emit(&AppEvent::TransportLost(e));
                return e;
            }
        };

        let outcome = service
            .borrow_mut()
            .handle_frame(&frame.data, frame.received_at, &mut events);
        if let Ok(Some(summary)) = outcome {
            closed.send(summary).await;
        }
    }
}

/// Sampler task: one snapshot per interval while Running, idle polling otherwise.
async fn sampler_loop<C: Clock, E: EventSink>(
    service: SharedService,
    clock: &C,
    mut events: SharedEvents<E>,
) {
    loop {
        let delay = service.borrow().sample_delay();
        Timer::after(delay).await;

        let delta_ms = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        service
            .borrow_mut()
            .sample(clock.now_secs(), delta_ms, &mut events);
    }
}

/// Upload task: drains one batch per interval.  The service borrow ends
/// before the (possibly retrying) upload starts.
///
/// `stop` is only checked between cycles: a batch taken off the queue is
/// always delivered or reported dropped.
async fn upload_loop<S: TelemetrySink, E: EventSink>(
    service: SharedService,
    uploader: &mut BatchUploader,
    sink: &mut S,
    interval: Duration,
    stop: &StopSignal,
    mut events: SharedEvents<E>,
) {
    loop {
        let due = future::or(
            async {
                Timer::after(interval).await;
                true
            },
            async {
                stop.wait().await;
                false
            },
        )
        .await;
        if !due {
            debug!("Upload task stopping");
            return;
        }

        let batch = service.borrow_mut().take_batch();
        uploader.run_cycle(batch, sink, &mut events).await;
    }
}

/// Display task: read-only; renders status text and live aggregates.
async fn display_loop<D: StatusDisplay, C: Clock>(
    service: SharedService,
    display: &mut D,
    clock: &C,
    interval: Duration,
) {
    loop {
        let now = clock.now_secs();
        let (status, snapshot) = {
            let svc = service.borrow();
            let snapshot = if svc.state() == SessionState::Running {
                svc.current_snapshot(now)
            } else {
                None
            };
            (svc.status_line(now), snapshot)
        };

        display.render_status(&status);
        if let Some(snapshot) = snapshot {
            display.render_snapshot(&snapshot);
        }
        Timer::after(interval).await;
    }
}

/// Lifecycle task: consumes the session-closed signal and resets.
async fn lifecycle_loop(service: SharedService, closed: &ClosedChannel) {
    loop {
        let summary = closed.receive().await;
        close_session(&service, &summary);
    }
}

fn close_session(service: &SharedService, summary: &SessionSummary) {
    info!(
        "Session {} closed: {}s active, {:.2} km, {:.0} kcal",
        summary.session_id, summary.active_secs, summary.distance_km, summary.calories_kcal
    );
    service.borrow_mut().reset();
}

// ── Pipeline ─────────────────────────────────────────────────

/// The assembled pipeline: service, uploader and the driven adapters.
pub struct Pipeline<S, D, E> {
    service: SharedService,
    uploader: BatchUploader,
    sink: S,
    display: D,
    events: SharedEvents<E>,
    upload_interval: Duration,
    display_interval: Duration,
}

impl<S: TelemetrySink, D: StatusDisplay, E: EventSink> Pipeline<S, D, E> {
    /// Assemble a pipeline.  `config` is assumed validated.
    pub fn new(config: TelemetryConfig, sink: S, display: D, events: E) -> Self {
        let uploader = BatchUploader::from_config(&config);
        let upload_interval = Duration::from_millis(u64::from(config.upload_interval_ms));
        Self {
            service: Rc::new(RefCell::new(TelemetryService::new(config))),
            uploader,
            sink,
            display,
            events: SharedEvents::new(events),
            upload_interval,
            display_interval: DISPLAY_INTERVAL,
        }
    }

    /// Override the display refresh period.
    pub fn with_display_interval(mut self, interval: Duration) -> Self {
        self.display_interval = interval;
        self
    }

    /// Run all tasks until `source` fails.  Returns that failure.
    ///
    /// An upload cycle in progress at that moment finishes first; the other
    /// tasks are then cancelled.  A session-closed signal still in the
    /// channel is applied, and the decoder's layout cache is cleared, since
    /// the next connection may announce different flags.
    pub fn run_until_disconnect<F: FrameSource, C: Clock>(
        &mut self,
        source: &mut F,
        clock: &C,
    ) -> TransportError {
        let closed: ClosedChannel = Channel::new();
        let stop: StopSignal = Signal::new();
        let executor: edge_executor::LocalExecutor<'_, MAX_TASKS> =
            edge_executor::LocalExecutor::new();

        let Self {
            service,
            uploader,
            sink,
            display,
            events,
            upload_interval,
            display_interval,
        } = self;

        let sampler = executor.spawn(sampler_loop(service.clone(), clock, events.clone()));
        let display = executor.spawn(display_loop(
            service.clone(),
            display,
            clock,
            *display_interval,
        ));
        let lifecycle = executor.spawn(lifecycle_loop(service.clone(), &closed));
        let upload = executor.spawn(upload_loop(
            service.clone(),
            uploader,
            sink,
            *upload_interval,
            &stop,
            events.clone(),
        ));

        info!("Pipeline running");

        let error = future::block_on(executor.run(async {
            let error = decode_loop(service.clone(), source, &closed, events.clone()).await;
            stop.signal(());
            upload.await;
            sampler.cancel().await;
            display.cancel().await;
            lifecycle.cancel().await;
            error
        }));

        if let Ok(summary) = closed.try_receive() {
            close_session(service, &summary);
        }
        service.borrow_mut().on_reconnect();
        error
    }

    /// Number of live handles to the service.  1 whenever no run is active.
    pub fn service_handles(&self) -> usize {
        Rc::strong_count(&self.service)
    }

    /// Read-only view of the service (between runs).
    pub fn service(&self) -> Ref<'_, TelemetryService> {
        self.service.borrow()
    }

    pub fn uploader(&self) -> &BatchUploader {
        &self.uploader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn events(&self) -> Ref<'_, E> {
        self.events.borrow()
    }
}
