//! Mock camera platform for testing and development.
//!
//! This module provides a simulated camera platform whose device list,
//! timings, and failures can be scripted through a [`MockCameraHandle`].
//! Every platform call is recorded so tests can assert on ordering and
//! overlap.

use crate::{
    PlatformError, Result,
    traits::{CameraPlatform, DecodeCallback, DecodeSink},
    types::{CaptureDevice, CaptureTarget, DecodeFrame},
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// A platform call as observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// `list_devices` was called.
    ListDevices,

    /// `acquire` started for a target.
    AcquireStarted(CaptureTarget),

    /// `acquire` resolved; `Some(id)` on success.
    AcquireFinished(CaptureTarget, Option<u64>),

    /// `release` started for a session id.
    ReleaseStarted(u64),

    /// `release` resolved for a session id.
    ReleaseFinished(u64),
}

/// Session opened by [`MockCamera`].
#[derive(Debug, PartialEq, Eq)]
pub struct MockSession {
    id: u64,
    target: CaptureTarget,
}

impl MockSession {
    /// Session id, unique per mock.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Target the session was opened against.
    pub fn target(&self) -> &CaptureTarget {
        &self.target
    }
}

struct LiveSession {
    target: CaptureTarget,
    sink: DecodeCallback,
}

struct MockState {
    devices: Vec<CaptureDevice>,
    enumeration_error: Option<PlatformError>,
    surface_attached: bool,
    acquire_delay: Duration,
    release_delay: Duration,
    acquire_failures: VecDeque<PlatformError>,
    release_failures: VecDeque<PlatformError>,
    next_session_id: u64,
    live: HashMap<u64, LiveSession>,
    calls: Vec<PlatformCall>,
    pending_ops: usize,
    max_pending_ops: usize,
}

impl MockState {
    fn begin_op(&mut self, call: PlatformCall) {
        self.calls.push(call);
        self.pending_ops += 1;
        self.max_pending_ops = self.max_pending_ops.max(self.pending_ops);
    }

    fn end_op(&mut self, call: PlatformCall) {
        self.calls.push(call);
        self.pending_ops = self.pending_ops.saturating_sub(1);
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock camera platform for testing and development.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tillscan_hardware::mock::MockCamera;
/// use tillscan_hardware::traits::{CameraPlatform, DecodeSink};
/// use tillscan_hardware::types::{CaptureDevice, CaptureTarget, DecodeFrame};
///
/// struct Collect(Mutex<Vec<String>>);
///
/// impl DecodeSink for Collect {
///     fn on_frame(&self, frame: DecodeFrame) {
///         if let DecodeFrame::Decoded(text) = frame {
///             self.0.lock().unwrap().push(text);
///         }
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> tillscan_hardware::Result<()> {
///     let (camera, handle) = MockCamera::with_devices(vec![CaptureDevice::new("0", "HD Webcam")]);
///
///     let sink = Arc::new(Collect(Mutex::new(Vec::new())));
///     let session = camera.acquire(&CaptureTarget::device("0"), sink.clone()).await?;
///
///     // Simulate the decoder finding a code
///     assert_eq!(handle.decode("4006381333931"), 1);
///     assert_eq!(sink.0.lock().unwrap().as_slice(), ["4006381333931"]);
///
///     camera.release(session).await
/// }
/// ```
#[derive(Clone)]
pub struct MockCamera {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MockCamera")
            .field("devices", &state.devices)
            .field("live_sessions", &state.live.len())
            .finish()
    }
}

impl MockCamera {
    /// Create a mock with a single unclassified camera.
    ///
    /// Returns a tuple of (MockCamera, MockCameraHandle) where the handle
    /// scripts the platform's behavior.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_devices(vec![CaptureDevice::new("mock-0", "Mock Camera")])
    }

    /// Create a mock exposing the given devices.
    pub fn with_devices(devices: Vec<CaptureDevice>) -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(MockState {
            devices,
            enumeration_error: None,
            surface_attached: true,
            acquire_delay: Duration::ZERO,
            release_delay: Duration::ZERO,
            acquire_failures: VecDeque::new(),
            release_failures: VecDeque::new(),
            next_session_id: 1,
            live: HashMap::new(),
            calls: Vec::new(),
            pending_ops: 0,
            max_pending_ops: 0,
        }));

        let camera = Self {
            state: state.clone(),
        };
        let handle = MockCameraHandle { state };

        (camera, handle)
    }
}

impl CameraPlatform for MockCamera {
    type Session = MockSession;

    async fn list_devices(&self) -> Result<Vec<CaptureDevice>> {
        let mut state = lock(&self.state);
        state.calls.push(PlatformCall::ListDevices);
        match state.enumeration_error.clone() {
            Some(error) => Err(error),
            None => Ok(state.devices.clone()),
        }
    }

    fn surface_attached(&self) -> bool {
        lock(&self.state).surface_attached
    }

    async fn acquire(&self, target: &CaptureTarget, sink: DecodeCallback) -> Result<MockSession> {
        let delay = {
            let mut state = lock(&self.state);
            state.begin_op(PlatformCall::AcquireStarted(target.clone()));
            state.acquire_delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        let outcome = if let Some(error) = state.acquire_failures.pop_front() {
            Err(error)
        } else if !state.surface_attached {
            Err(PlatformError::ContainerMissing)
        } else if let Some(id) = target.as_device()
            && !state.devices.iter().any(|device| device.id == id)
        {
            Err(PlatformError::device_not_found(id))
        } else {
            let id = state.next_session_id;
            state.next_session_id += 1;
            state.live.insert(
                id,
                LiveSession {
                    target: target.clone(),
                    sink,
                },
            );
            Ok(MockSession {
                id,
                target: target.clone(),
            })
        };

        let session_id = outcome.as_ref().ok().map(MockSession::id);
        trace!(%target, ?session_id, "mock acquire resolved");
        state.end_op(PlatformCall::AcquireFinished(target.clone(), session_id));
        outcome
    }

    async fn release(&self, session: MockSession) -> Result<()> {
        let delay = {
            let mut state = lock(&self.state);
            state.begin_op(PlatformCall::ReleaseStarted(session.id));
            state.release_delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        let was_live = state.live.remove(&session.id).is_some();
        let outcome = match state.release_failures.pop_front() {
            Some(error) => Err(error),
            None if !was_live => Err(PlatformError::NotRunning),
            None => Ok(()),
        };
        trace!(session = session.id, was_live, "mock release resolved");
        state.end_op(PlatformCall::ReleaseFinished(session.id));
        outcome
    }
}

/// Handle for scripting a mock camera.
///
/// Clones share the same underlying platform state.
#[derive(Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockCameraHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCameraHandle").finish_non_exhaustive()
    }
}

impl MockCameraHandle {
    /// Replace the enumerated device list.
    pub fn set_devices(&self, devices: Vec<CaptureDevice>) {
        lock(&self.state).devices = devices;
    }

    /// Make every subsequent enumeration fail with `error`.
    pub fn fail_enumeration(&self, error: PlatformError) {
        lock(&self.state).enumeration_error = Some(error);
    }

    /// Let enumeration succeed again.
    pub fn clear_enumeration_failure(&self) {
        lock(&self.state).enumeration_error = None;
    }

    /// Attach or detach the preview surface.
    pub fn set_surface_attached(&self, attached: bool) {
        lock(&self.state).surface_attached = attached;
    }

    /// Time each acquire spends inside the platform.
    pub fn set_acquire_delay(&self, delay: Duration) {
        lock(&self.state).acquire_delay = delay;
    }

    /// Time each release spends inside the platform.
    pub fn set_release_delay(&self, delay: Duration) {
        lock(&self.state).release_delay = delay;
    }

    /// Fail the next acquire with `error`. Queued failures apply in order.
    pub fn fail_next_acquire(&self, error: PlatformError) {
        lock(&self.state).acquire_failures.push_back(error);
    }

    /// Fail the next release with `error`. The session is still torn down.
    pub fn fail_next_release(&self, error: PlatformError) {
        lock(&self.state).release_failures.push_back(error);
    }

    /// Deliver a decoded payload to every live session.
    ///
    /// Returns the number of sessions that received it.
    pub fn decode(&self, text: impl Into<String>) -> usize {
        self.deliver(DecodeFrame::Decoded(text.into()))
    }

    /// Deliver a decode miss to every live session.
    pub fn miss(&self) -> usize {
        self.deliver(DecodeFrame::Miss)
    }

    /// Deliver a frame through a sink that was handed to an acquire, even if
    /// its session has since been released.
    ///
    /// Simulates a platform whose decode callback fires late.
    pub fn decode_late(&self, sink: &DecodeCallback, text: impl Into<String>) {
        sink.on_frame(DecodeFrame::Decoded(text.into()));
    }

    /// Sinks of the live sessions, oldest first.
    pub fn live_sinks(&self) -> Vec<DecodeCallback> {
        let state = lock(&self.state);
        let mut ids: Vec<_> = state.live.keys().copied().collect();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|id| state.live.get(id).map(|live| live.sink.clone()))
            .collect()
    }

    fn deliver(&self, frame: DecodeFrame) -> usize {
        // Sinks run outside the lock; they may call back into the platform.
        let sinks = self.live_sinks();
        for sink in &sinks {
            sink.on_frame(frame.clone());
        }
        sinks.len()
    }

    /// Number of sessions currently open.
    pub fn live_sessions(&self) -> usize {
        lock(&self.state).live.len()
    }

    /// Targets of the sessions currently open.
    pub fn live_targets(&self) -> Vec<CaptureTarget> {
        let state = lock(&self.state);
        let mut live: Vec<_> = state.live.iter().collect();
        live.sort_unstable_by_key(|(id, _)| **id);
        live.into_iter().map(|(_, s)| s.target.clone()).collect()
    }

    /// Every platform call so far, in order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of acquires started.
    pub fn acquire_count(&self) -> usize {
        self.count(|call| matches!(call, PlatformCall::AcquireStarted(_)))
    }

    /// Number of releases started.
    pub fn release_count(&self) -> usize {
        self.count(|call| matches!(call, PlatformCall::ReleaseStarted(_)))
    }

    /// Number of enumerations.
    pub fn enumeration_count(&self) -> usize {
        self.count(|call| matches!(call, PlatformCall::ListDevices))
    }

    fn count(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Highest number of acquire/release calls that were pending at once.
    pub fn max_concurrent_ops(&self) -> usize {
        lock(&self.state).max_pending_ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Facing;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        decoded: AtomicUsize,
        missed: AtomicUsize,
    }

    impl DecodeSink for Counter {
        fn on_frame(&self, frame: DecodeFrame) {
            match frame {
                DecodeFrame::Decoded(_) => self.decoded.fetch_add(1, Ordering::SeqCst),
                DecodeFrame::Miss => self.missed.fetch_add(1, Ordering::SeqCst),
            };
        }
    }

    #[tokio::test]
    async fn test_mock_camera_acquire_and_decode() {
        let (camera, handle) = MockCamera::new();
        let sink = Arc::new(Counter::default());

        let session = camera
            .acquire(&CaptureTarget::device("mock-0"), sink.clone())
            .await
            .unwrap();
        assert_eq!(session.target(), &CaptureTarget::device("mock-0"));

        assert_eq!(handle.decode("123"), 1);
        assert_eq!(handle.miss(), 1);
        assert_eq!(sink.decoded.load(Ordering::SeqCst), 1);
        assert_eq!(sink.missed.load(Ordering::SeqCst), 1);

        camera.release(session).await.unwrap();
        assert_eq!(handle.decode("456"), 0);
        assert_eq!(sink.decoded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_camera_unknown_device() {
        let (camera, handle) = MockCamera::new();
        let result = camera
            .acquire(&CaptureTarget::device("nope"), Arc::new(Counter::default()))
            .await;

        assert_eq!(result, Err(PlatformError::device_not_found("nope")));
        assert_eq!(handle.live_sessions(), 0);
        assert_eq!(
            handle.calls().last(),
            Some(&PlatformCall::AcquireFinished(CaptureTarget::device("nope"), None))
        );
    }

    #[tokio::test]
    async fn test_mock_camera_detached_surface() {
        let (camera, handle) = MockCamera::new();
        handle.set_surface_attached(false);
        assert!(!camera.surface_attached());

        let result = camera
            .acquire(&CaptureTarget::Facing(Facing::Back), Arc::new(Counter::default()))
            .await;
        assert_eq!(result.unwrap_err(), PlatformError::ContainerMissing);
    }

    #[tokio::test]
    async fn test_mock_camera_scripted_failures() {
        let (camera, handle) = MockCamera::new();
        handle.fail_next_acquire(PlatformError::permission_denied("denied"));

        let sink: DecodeCallback = Arc::new(Counter::default());
        let first = camera.acquire(&CaptureTarget::device("mock-0"), sink.clone()).await;
        assert!(matches!(first, Err(PlatformError::PermissionDenied { .. })));

        let session = camera
            .acquire(&CaptureTarget::device("mock-0"), sink)
            .await
            .unwrap();

        handle.fail_next_release(PlatformError::other("device busy"));
        let released = camera.release(session).await;
        assert_eq!(released, Err(PlatformError::other("device busy")));
        assert_eq!(handle.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_mock_camera_double_release_reports_not_running() {
        let (camera, _handle) = MockCamera::new();
        let session = camera
            .acquire(&CaptureTarget::device("mock-0"), Arc::new(Counter::default()))
            .await
            .unwrap();
        let id = session.id();
        camera.release(session).await.unwrap();

        let stale = MockSession {
            id,
            target: CaptureTarget::device("mock-0"),
        };
        assert_eq!(camera.release(stale).await, Err(PlatformError::NotRunning));
    }

    #[tokio::test]
    async fn test_mock_camera_enumeration_failure() {
        let (camera, handle) = MockCamera::new();
        handle.fail_enumeration(PlatformError::permission_denied("blocked"));
        assert!(camera.list_devices().await.is_err());

        handle.clear_enumeration_failure();
        assert_eq!(camera.list_devices().await.unwrap().len(), 1);
        assert_eq!(handle.enumeration_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_camera_tracks_overlap() {
        let (camera, handle) = MockCamera::new();
        handle.set_acquire_delay(Duration::from_millis(50));

        let sink: DecodeCallback = Arc::new(Counter::default());
        let target = CaptureTarget::device("mock-0");
        let (a, b) = tokio::join!(
            camera.acquire(&target, sink.clone()),
            camera.acquire(&target, sink.clone())
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(handle.max_concurrent_ops(), 2);
        assert_eq!(handle.live_targets().len(), 2);
    }
}
