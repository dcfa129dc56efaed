//! Capture session controller.
//!
//! The controller owns the one capture session a panel may hold and moves it
//! through [`SessionState`]. Start, stop and switch requests may overlap
//! freely; an explicit in-flight marker lets exactly one of them run while
//! the others return [`ControlOutcome::Busy`].
//!
//! Every chain captures the panel's [`CancellationToken`] when it begins and
//! re-checks it after each suspension point (acquire, release, settle,
//! stabilize). A cancelled chain lets the platform call finish but changes
//! nothing and emits nothing.
//!
//! The session handle lives in a slot that is emptied *before* release is
//! awaited, so a concurrent request never sees a handle that is already
//! being torn down.
//!
//! Platform acquire and release calls are serialised by a hardware gate that
//! outlives panel sessions. A release left running by a closed panel
//! therefore finishes, and the settle delay passes, before a reopened panel
//! acquires again.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tillscan_core::ScanSource;
use tillscan_hardware::{CameraPlatform, CaptureTarget, DecodeCallback, DecodeFrame, DecodeSink};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{ScannerConfig, SessionTiming};
use crate::error::AcquireError;
use crate::events::Emitter;
use crate::state::{SessionMachine, SessionState, SessionTransition};

/// Operation currently holding the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
    Start,
    Stop,
    Switch,
}

/// How a control request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The request ran to completion.
    Done,

    /// Another start, stop or switch was in flight; nothing happened.
    Busy,

    /// The request does not apply in the current state.
    Ignored,

    /// The panel went away (or a precondition failed) partway through.
    Aborted,

    /// The platform refused to open the camera.
    Failed(AcquireError),
}

impl ControlOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

struct LiveSession<S> {
    generation: u64,
    session: S,
}

struct Shared<S> {
    machine: SessionMachine,
    in_flight: Option<InFlight>,
    slot: Option<LiveSession<S>>,
    panel_open: bool,
    token: CancellationToken,
    target: Option<CaptureTarget>,
    generation: u64,
    last_decode: Option<(String, Instant)>,
}

impl<S> Shared<S> {
    fn new() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self {
            machine: SessionMachine::new(),
            in_flight: None,
            slot: None,
            panel_open: false,
            token,
            target: None,
            generation: 0,
            last_decode: None,
        }
    }

    fn enter(&mut self, to: SessionState) {
        match self.machine.transition_to(to) {
            Ok(transition) => debug!(from = %transition.from, to = %transition.to, "session transition"),
            Err(error) => warn!(%error, "session transition rejected"),
        }
    }
}

fn lock<S>(shared: &Mutex<Shared<S>>) -> MutexGuard<'_, Shared<S>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Release a session, absorbing every failure.
async fn teardown<P: CameraPlatform>(platform: &P, session: P::Session) {
    match platform.release(session).await {
        Ok(()) => debug!("capture session released"),
        Err(error) if error.is_benign_teardown() => {
            debug!(%error, "capture session was already inactive");
        }
        Err(error) => warn!(%error, "capture session release failed"),
    }
}

/// Single-owner driver of one capture session.
pub struct SessionController<P: CameraPlatform> {
    platform: Arc<P>,
    timing: SessionTiming,
    repeat_cooldown: Duration,
    events: Emitter,
    shared: Arc<Mutex<Shared<P::Session>>>,
    /// Held across every platform acquire and release; records when the
    /// last release finished.
    hardware: tokio::sync::Mutex<Option<Instant>>,
}

impl<P: CameraPlatform> fmt::Debug for SessionController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("SessionController")
            .field("state", shared.machine.current_state())
            .field("in_flight", &shared.in_flight)
            .field("target", &shared.target)
            .field("panel_open", &shared.panel_open)
            .finish_non_exhaustive()
    }
}

impl<P: CameraPlatform> SessionController<P> {
    pub(crate) fn new(platform: Arc<P>, config: &ScannerConfig, events: Emitter) -> Self {
        Self {
            platform,
            timing: config.timing.clone(),
            repeat_cooldown: config.camera_repeat_cooldown,
            events,
            shared: Arc::new(Mutex::new(Shared::new())),
            hardware: tokio::sync::Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<P::Session>> {
        lock(&self.shared)
    }

    /// Release a session once no other platform call is running.
    async fn release(&self, session: P::Session) {
        let mut released_at = self.hardware.lock().await;
        teardown(self.platform.as_ref(), session).await;
        *released_at = Some(Instant::now());
    }

    /// Begin a panel session and return its cancellation token.
    ///
    /// A session still held by the previous panel is released first.
    pub async fn mount(&self) -> CancellationToken {
        let (token, leftover) = {
            let mut shared = self.lock();
            shared.token.cancel();
            shared.token = CancellationToken::new();
            shared.panel_open = true;
            shared.in_flight = None;
            shared.machine.reset();
            shared.target = None;
            shared.last_decode = None;
            (shared.token.clone(), shared.slot.take())
        };

        if let Some(live) = leftover {
            debug!(generation = live.generation, "releasing session left by previous panel");
            self.release(live.session).await;
        }
        token
    }

    /// End the panel session.
    ///
    /// Cancels every in-flight chain, forces `Idle`, and releases any held
    /// session without emitting anything.
    pub async fn unmount(&self) {
        let live = {
            let mut shared = self.lock();
            shared.token.cancel();
            shared.panel_open = false;
            shared.in_flight = None;
            shared.last_decode = None;
            if let Some(transition) = shared.machine.reset() {
                debug!(from = %transition.from, "session reset on unmount");
            }
            shared.slot.take()
        };

        if let Some(live) = live {
            self.release(live.session).await;
        }
    }

    /// Open a session against `target` from `Idle` or `Failed`.
    pub async fn start(&self, target: CaptureTarget) -> ControlOutcome {
        let token = {
            let mut shared = self.lock();
            if let Some(op) = shared.in_flight {
                debug!(?op, %target, "start rejected, operation in flight");
                return ControlOutcome::Busy;
            }
            let startable = matches!(
                shared.machine.current_state(),
                SessionState::Idle | SessionState::Failed(_)
            );
            if !shared.panel_open || !startable {
                return ControlOutcome::Ignored;
            }
            shared.in_flight = Some(InFlight::Start);
            shared.target = Some(target.clone());
            shared.enter(SessionState::Starting);
            shared.token.clone()
        };

        self.acquire_phase(target, token).await
    }

    /// Re-attempt the last target after a failed start.
    pub async fn retry(&self) -> ControlOutcome {
        let target = {
            let shared = self.lock();
            match (shared.machine.current_state(), &shared.target) {
                (SessionState::Failed(_), Some(target)) => target.clone(),
                _ => return ControlOutcome::Ignored,
            }
        };
        self.start(target).await
    }

    /// User stop: tear the active session down and return to `Idle`.
    pub async fn stop(&self) -> ControlOutcome {
        let (live, token) = {
            let mut shared = self.lock();
            if let Some(op) = shared.in_flight {
                debug!(?op, "stop rejected, operation in flight");
                return ControlOutcome::Busy;
            }
            if *shared.machine.current_state() != SessionState::Active {
                return ControlOutcome::Ignored;
            }
            shared.in_flight = Some(InFlight::Stop);
            shared.enter(SessionState::Stopping);
            (shared.slot.take(), shared.token.clone())
        };

        if let Some(live) = live {
            self.release(live.session).await;
        }

        let mut shared = self.lock();
        if token.is_cancelled() {
            return ControlOutcome::Aborted;
        }
        shared.enter(SessionState::Idle);
        shared.in_flight = None;
        info!("camera stopped");
        ControlOutcome::Done
    }

    /// Switch to another device or facing.
    ///
    /// From `Active` this stops the current session, waits the settle delay,
    /// then starts `target`. From `Idle` or `Failed` it starts directly.
    pub async fn switch_to(&self, target: CaptureTarget) -> ControlOutcome {
        let prepared = {
            let mut shared = self.lock();
            if let Some(op) = shared.in_flight {
                debug!(?op, %target, "switch rejected, operation in flight");
                return ControlOutcome::Busy;
            }
            if !shared.panel_open {
                return ControlOutcome::Ignored;
            }
            let state = shared.machine.current_state().clone();
            match state {
                SessionState::Active => {
                    shared.in_flight = Some(InFlight::Switch);
                    shared.target = Some(target.clone());
                    shared.enter(SessionState::SwitchingDevice);
                    Some((shared.slot.take(), shared.token.clone()))
                }
                SessionState::Idle | SessionState::Failed(_) => None,
                _ => return ControlOutcome::Ignored,
            }
        };

        let Some((live, token)) = prepared else {
            return self.start(target).await;
        };

        debug!(%target, "switching camera");
        if let Some(live) = live {
            self.release(live.session).await;
        }
        if token.is_cancelled() {
            debug!(%target, "switch abandoned after stop phase");
            return ControlOutcome::Aborted;
        }

        if !self.timing.settle_delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(self.timing.settle_delay) => {}
            }
        }

        {
            let mut shared = self.lock();
            if token.is_cancelled() {
                debug!(%target, "switch abandoned after settle");
                return ControlOutcome::Aborted;
            }
            shared.enter(SessionState::Starting);
            shared.in_flight = Some(InFlight::Start);
        }

        self.acquire_phase(target, token).await
    }

    /// Acquire and stabilize. Entered in `Starting` with `InFlight::Start`.
    async fn acquire_phase(&self, target: CaptureTarget, token: CancellationToken) -> ControlOutcome {
        let mut hardware = tokio::select! {
            _ = token.cancelled() => return ControlOutcome::Aborted,
            gate = self.hardware.lock() => gate,
        };
        if let Some(released_at) = *hardware {
            let settled = released_at + self.timing.settle_delay;
            if settled > Instant::now() {
                debug!(%target, "waiting for the released camera to settle");
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep_until(settled) => {}
                }
            }
        }

        let (generation, sink) = {
            let mut shared = self.lock();
            if token.is_cancelled() {
                return ControlOutcome::Aborted;
            }
            if !shared.panel_open || !self.platform.surface_attached() {
                debug!(%target, "acquire preconditions failed, start abandoned");
                shared.enter(SessionState::Idle);
                shared.in_flight = None;
                return ControlOutcome::Aborted;
            }
            shared.generation += 1;
            let generation = shared.generation;
            let sink: DecodeCallback = Arc::new(CameraDecodeSink {
                generation,
                token: token.clone(),
                shared: Arc::downgrade(&self.shared),
                events: self.events.clone(),
                cooldown: self.repeat_cooldown,
            });
            (generation, sink)
        };

        debug!(%target, generation, "acquiring capture session");
        let result = self.platform.acquire(&target, sink).await;

        let held: Result<(), Option<P::Session>> = {
            let mut shared = self.lock();
            if token.is_cancelled() {
                debug!(%target, "acquire resolved after unmount");
                Err(result.ok())
            } else {
                match result {
                    Ok(session) if !self.platform.surface_attached() => {
                        debug!(%target, "surface detached during acquire, start abandoned");
                        shared.enter(SessionState::Idle);
                        shared.in_flight = None;
                        Err(Some(session))
                    }
                    Ok(session) => {
                        shared.slot = Some(LiveSession {
                            generation,
                            session,
                        });
                        Ok(())
                    }
                    Err(error) => {
                        let reason = AcquireError::from(error);
                        warn!(%target, error = %reason, "camera failed to start");
                        shared.enter(SessionState::Failed(reason.clone()));
                        shared.in_flight = None;
                        self.events.error(reason.user_message());
                        return ControlOutcome::Failed(reason);
                    }
                }
            }
        };

        if let Err(orphan) = held {
            if let Some(session) = orphan {
                teardown(self.platform.as_ref(), session).await;
                *hardware = Some(Instant::now());
            }
            return ControlOutcome::Aborted;
        }
        drop(hardware);

        if !self.timing.stabilize_delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(self.timing.stabilize_delay) => {}
            }
        }

        let detached = {
            let mut shared = self.lock();
            if token.is_cancelled() {
                // unmount already took the slot and released it
                return ControlOutcome::Aborted;
            }
            if self.platform.surface_attached() {
                shared.enter(SessionState::Active);
                shared.in_flight = None;
                info!(%target, "camera active");
                return ControlOutcome::Done;
            }
            debug!(%target, "surface detached while stabilizing, start abandoned");
            shared.enter(SessionState::Idle);
            shared.in_flight = None;
            shared.slot.take()
        };

        if let Some(live) = detached {
            self.release(live.session).await;
        }
        ControlOutcome::Aborted
    }

    /// Time spent in the current session state.
    pub fn time_in_state(&self) -> Duration {
        self.lock().machine.time_in_current_state()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lock().machine.current_state().clone()
    }

    /// Operation in flight, if any.
    pub fn in_flight(&self) -> Option<InFlight> {
        self.lock().in_flight
    }

    /// Whether a start, stop or switch is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    /// Whether a panel session is mounted.
    pub fn is_mounted(&self) -> bool {
        self.lock().panel_open
    }

    /// Target of the last start or switch.
    pub fn target(&self) -> Option<CaptureTarget> {
        self.lock().target.clone()
    }

    /// Recorded state transitions, oldest first.
    pub fn history(&self) -> Vec<SessionTransition> {
        self.lock().machine.history().iter().cloned().collect()
    }
}

/// Decode callback handed to the platform for one acquire.
///
/// Emits only while its own session is the live one and `Active`.
struct CameraDecodeSink<S> {
    generation: u64,
    token: CancellationToken,
    shared: Weak<Mutex<Shared<S>>>,
    events: Emitter,
    cooldown: Duration,
}

impl<S: Send + 'static> DecodeSink for CameraDecodeSink<S> {
    fn on_frame(&self, frame: DecodeFrame) {
        let text = match frame {
            DecodeFrame::Decoded(text) => text,
            DecodeFrame::Miss => {
                trace!(generation = self.generation, "decode miss");
                return;
            }
        };

        let Some(cell) = self.shared.upgrade() else {
            return;
        };
        // Emit under the lock so decodes keep their order.
        let mut shared = lock(&cell);

        let live = !self.token.is_cancelled()
            && shared
                .slot
                .as_ref()
                .is_some_and(|live| live.generation == self.generation)
            && *shared.machine.current_state() == SessionState::Active;
        if !live {
            trace!(generation = self.generation, "decode from inactive session dropped");
            return;
        }

        let text = text.trim();
        let now = Instant::now();
        if !self.cooldown.is_zero()
            && let Some((last, at)) = &shared.last_decode
            && last == text
            && now.duration_since(*at) < self.cooldown
        {
            trace!(text, "repeat decode within cooldown dropped");
            return;
        }

        if self.events.scan_text(text, ScanSource::Camera) {
            shared.last_decode = Some((text.to_owned(), now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ScannerEvent, ScannerEvents};
    use tillscan_hardware::PlatformError;
    use tillscan_hardware::mock::{MockCamera, MockCameraHandle};

    fn controller(
        config: ScannerConfig,
    ) -> (SessionController<MockCamera>, MockCameraHandle, ScannerEvents) {
        let (camera, handle) = MockCamera::new();
        let (emitter, events) = Emitter::channel();
        let controller = SessionController::new(Arc::new(camera), &config, emitter);
        (controller, handle, events)
    }

    fn target() -> CaptureTarget {
        CaptureTarget::device("mock-0")
    }

    fn scans(events: &mut ScannerEvents) -> Vec<String> {
        events
            .drain()
            .iter()
            .filter_map(|e| e.as_scan().map(|s| s.text().to_owned()))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reaches_active() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;

        assert_eq!(controller.start(target()).await, ControlOutcome::Done);
        assert_eq!(controller.state(), SessionState::Active);
        assert!(!controller.is_busy());
        assert_eq!(controller.target(), Some(target()));
        assert_eq!(handle.live_sessions(), 1);
        assert!(events.drain().is_empty());

        let states: Vec<_> = controller.history().into_iter().map(|t| t.to).collect();
        assert_eq!(states, vec![SessionState::Starting, SessionState::Active]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_mount() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        assert_eq!(controller.start(target()).await, ControlOutcome::Ignored);
        assert_eq!(handle.acquire_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_surfaces_error_and_retries() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;
        handle.fail_next_acquire(PlatformError::permission_denied("NotAllowedError"));

        let outcome = controller.start(target()).await;
        assert_eq!(outcome, ControlOutcome::Failed(AcquireError::PermissionDenied));
        assert_eq!(
            controller.state(),
            SessionState::Failed(AcquireError::PermissionDenied)
        );
        assert_eq!(
            events.drain(),
            vec![ScannerEvent::Error(AcquireError::PermissionDenied.user_message())]
        );

        assert_eq!(controller.retry().await, ControlOutcome::Done);
        assert_eq!(controller.state(), SessionState::Active);
        assert_eq!(handle.acquire_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_outside_failed_is_ignored() {
        let (controller, _handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        assert_eq!(controller.retry().await, ControlOutcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_surface_aborts_silently() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;
        handle.set_surface_attached(false);

        assert_eq!(controller.start(target()).await, ControlOutcome::Aborted);
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.is_busy());
        assert_eq!(handle.acquire_count(), 0);
        assert!(events.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_once() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        controller.start(target()).await;

        assert_eq!(controller.stop().await, ControlOutcome::Done);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.stop().await, ControlOutcome::Ignored);
        assert_eq!(handle.release_count(), 1);
        assert_eq!(handle.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_failures_never_stick() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;

        controller.start(target()).await;
        handle.fail_next_release(PlatformError::NotRunning);
        assert_eq!(controller.stop().await, ControlOutcome::Done);
        assert_eq!(controller.state(), SessionState::Idle);

        controller.start(target()).await;
        handle.fail_next_release(PlatformError::other("camera exploded"));
        assert_eq!(controller.stop().await, ControlOutcome::Done);
        assert_eq!(controller.state(), SessionState::Idle);

        assert!(events.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_requests_are_busy() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        handle.set_acquire_delay(Duration::from_millis(50));

        let (first, second, third) = tokio::join!(
            controller.start(target()),
            controller.stop(),
            controller.switch_to(CaptureTarget::device("other"))
        );
        assert_eq!(first, ControlOutcome::Done);
        assert_eq!(second, ControlOutcome::Busy);
        assert_eq!(third, ControlOutcome::Busy);
        assert_eq!(handle.acquire_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_emits_only_while_active() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;

        let (outcome, delivered) = tokio::join!(controller.start(target()), async {
            // inside the stabilize window
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.decode("too-early")
        });
        assert!(outcome.is_done());
        assert_eq!(delivered, 1);
        assert!(scans(&mut events).is_empty());

        handle.miss();
        handle.decode(" 4006381333931 ");
        handle.decode("4006381333931");
        assert_eq!(scans(&mut events), vec!["4006381333931", "4006381333931"]);
        assert_eq!(controller.state(), SessionState::Active);

        let sink = handle.live_sinks().remove(0);
        controller.stop().await;
        handle.decode_late(&sink, "late");
        assert!(scans(&mut events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_cooldown() {
        let config =
            ScannerConfig::default().with_camera_repeat_cooldown(Duration::from_millis(1000));
        let (controller, handle, mut events) = controller(config);
        controller.mount().await;
        controller.start(target()).await;

        handle.decode("111");
        handle.decode("111");
        handle.decode("222");
        tokio::time::advance(Duration::from_millis(1001)).await;
        handle.decode("222");
        assert_eq!(scans(&mut events), vec!["111", "222", "222"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_acquire_releases_orphan() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;
        handle.set_acquire_delay(Duration::from_millis(50));

        let (outcome, ()) = tokio::join!(controller.start(target()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.unmount().await;
        });

        assert_eq!(outcome, ControlOutcome::Aborted);
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.is_mounted());
        assert_eq!(handle.release_count(), 1);
        assert_eq!(handle.live_sessions(), 0);
        assert!(events.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_settle_abandons_switch() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        controller.start(target()).await;

        let (outcome, ()) = tokio::join!(
            controller.switch_to(CaptureTarget::device("mock-0")),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                controller.unmount().await;
            }
        );

        assert_eq!(outcome, ControlOutcome::Aborted);
        assert_eq!(handle.acquire_count(), 1);
        assert_eq!(handle.live_sessions(), 0);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_surface_detached_while_stabilizing_releases_session() {
        let (controller, handle, mut events) = controller(ScannerConfig::default());
        controller.mount().await;

        let (outcome, ()) = tokio::join!(controller.start(target()), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.set_surface_attached(false);
        });

        assert_eq!(outcome, ControlOutcome::Aborted);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(handle.release_count(), 1);
        assert_eq!(handle.live_sessions(), 0);
        assert!(events.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_releases_leftover_session() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        controller.start(target()).await;

        controller.mount().await;
        assert_eq!(handle.release_count(), 1);
        assert_eq!(handle.live_sessions(), 0);
        assert_eq!(controller.state(), SessionState::Idle);

        assert_eq!(controller.start(target()).await, ControlOutcome::Done);
        assert_eq!(handle.live_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_release_waits_settle() {
        let config = ScannerConfig::default();
        let settle = config.timing.settle_delay;
        let stabilize = config.timing.stabilize_delay;
        let (controller, handle, _events) = controller(config);
        controller.mount().await;
        controller.start(target()).await;
        controller.stop().await;

        let started = Instant::now();
        assert_eq!(controller.start(target()).await, ControlOutcome::Done);
        assert!(started.elapsed() >= settle + stabilize);
        assert_eq!(handle.max_concurrent_ops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_waits_for_release_in_flight() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        controller.start(target()).await;
        handle.set_release_delay(Duration::from_millis(200));

        let (stopped, restarted) = tokio::join!(controller.stop(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.unmount().await;
            controller.mount().await;
            controller.start(CaptureTarget::device("other")).await
        });

        assert_eq!(stopped, ControlOutcome::Aborted);
        assert_eq!(restarted, ControlOutcome::Done);
        assert_eq!(handle.max_concurrent_ops(), 1);
        assert_eq!(handle.live_targets(), vec![CaptureTarget::device("other")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_state_follows_clock() {
        let (controller, _handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        controller.start(target()).await;

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(controller.time_in_state(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_from_failed_starts_directly() {
        let (controller, handle, _events) = controller(ScannerConfig::default());
        controller.mount().await;
        handle.fail_next_acquire(PlatformError::other("NotReadableError"));
        controller.start(target()).await;
        assert!(controller.state().is_failed());

        assert_eq!(controller.switch_to(target()).await, ControlOutcome::Done);
        assert_eq!(handle.release_count(), 0);
        assert_eq!(controller.state(), SessionState::Active);
    }
}
