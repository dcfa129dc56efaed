//! Public barcode input surface.
//!
//! [`BarcodeInput`] combines the three input channels behind one panel:
//! the camera (through the [`SessionController`]), a hardware keyboard
//! scanner (through the keystroke detector), and manual text entry. All of
//! them report through the [`ScannerEvents`] receiver returned by
//! [`BarcodeInput::new`].
//!
//! Only construction can fail, on an invalid configuration. Failures the
//! user should see arrive as
//! [`ScannerEvent::Error`](crate::events::ScannerEvent::Error); everything
//! else is absorbed and logged.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tillscan_core::{Result, ScanSource};
use tillscan_hardware::{CameraPlatform, CaptureDevice, CaptureTarget, Facing};
use tracing::{debug, info, warn};

use crate::catalog::{DeviceCatalog, SelectionMode};
use crate::config::ScannerConfig;
use crate::events::{Emitter, ScannerEvents};
use crate::keystroke::{KeyEvent, KeystrokeSubscription};
use crate::session::{ControlOutcome, SessionController};
use crate::state::{SessionState, SessionTransition};

/// Message shown when a selection arrives while the camera is busy.
pub const SWITCH_IN_PROGRESS: &str = "Camera switch already in progress";

#[derive(Default)]
struct PanelState {
    open: bool,
    title: Option<String>,
    catalog: Option<DeviceCatalog>,
    mode: Option<SelectionMode>,
    last_choice: Option<CaptureTarget>,
    last_error: Option<String>,
    keystrokes: Option<KeystrokeSubscription>,
}

/// Barcode input panel.
///
/// # Examples
///
/// ```
/// use tillscan_hardware::mock::MockCamera;
/// use tillscan_scanner::{BarcodeInput, ScannerConfig, ScannerEvent};
///
/// #[tokio::main]
/// async fn main() {
///     let (camera, handle) = MockCamera::new();
///     let (input, mut events) = BarcodeInput::new(camera, ScannerConfig::default()).unwrap();
///
///     input.open("Add item").await;
///     handle.decode("4006381333931");
///     input.submit_manual_text("  12345  ");
///
///     let scanned: Vec<String> = events
///         .drain()
///         .iter()
///         .filter_map(ScannerEvent::as_scan)
///         .map(|scan| scan.text().to_owned())
///         .collect();
///     assert_eq!(scanned, ["4006381333931", "12345"]);
///
///     input.close().await;
/// }
/// ```
pub struct BarcodeInput<P: CameraPlatform> {
    platform: Arc<P>,
    config: ScannerConfig,
    controller: SessionController<P>,
    events: Emitter,
    panel: Mutex<PanelState>,
}

impl<P: CameraPlatform> fmt::Debug for BarcodeInput<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let panel = self.panel();
        f.debug_struct("BarcodeInput")
            .field("open", &panel.open)
            .field("title", &panel.title)
            .field("mode", &panel.mode)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl<P: CameraPlatform> BarcodeInput<P> {
    /// Create a closed panel and the receiver for its events.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when [`ScannerConfig::validate`] rejects
    /// `config`.
    pub fn new(platform: P, config: ScannerConfig) -> Result<(Self, ScannerEvents)> {
        config.validate()?;
        let platform = Arc::new(platform);
        let (events, receiver) = Emitter::channel();
        let controller = SessionController::new(platform.clone(), &config, events.clone());

        let input = Self {
            platform,
            config,
            controller,
            events,
            panel: Mutex::new(PanelState::default()),
        };
        Ok((input, receiver))
    }

    fn panel(&self) -> MutexGuard<'_, PanelState> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Host-style visibility toggle.
    pub async fn set_open(&self, open: bool, title: Option<String>) {
        if open {
            self.open(title.unwrap_or_default()).await;
        } else {
            self.close().await;
        }
    }

    /// Open the panel.
    ///
    /// Resets all state, arms the keystroke detector, loads the device list
    /// and starts the camera on the remembered or default target.
    pub async fn open(&self, title: impl Into<String>) {
        self.close().await;

        let title = title.into();
        let token = self.controller.mount().await;
        {
            let mut panel = self.panel();
            panel.open = true;
            panel.title = Some(title.clone());
            panel.keystrokes = Some(KeystrokeSubscription::arm(
                self.config.keystroke.clone(),
                self.events.clone(),
            ));
        }
        info!(%title, "scanner opened");

        let loaded = DeviceCatalog::load(self.platform.as_ref()).await;
        if token.is_cancelled() {
            debug!("scanner closed during device enumeration");
            return;
        }

        let target = {
            let mut panel = self.panel();
            match loaded {
                Ok(catalog) => {
                    let target = catalog.resolve(panel.last_choice.as_ref());
                    panel.mode = Some(SelectionMode::of(&target));
                    panel.catalog = Some(catalog);
                    target
                }
                Err(error) => {
                    warn!(%error, "camera enumeration failed");
                    let message = error.user_message();
                    panel.last_error = Some(message.clone());
                    self.events.error(message);
                    return;
                }
            }
        };

        let outcome = self.controller.start(target.clone()).await;
        self.record(&outcome, &target, false);
    }

    /// Close the panel.
    ///
    /// Tears the camera down without emitting, disarms the keystroke
    /// detector and clears every buffer. The last successful selection is
    /// kept for the next open.
    pub async fn close(&self) {
        let (was_open, keystrokes) = {
            let mut panel = self.panel();
            let was_open = panel.open;
            panel.open = false;
            panel.title = None;
            panel.catalog = None;
            panel.mode = None;
            panel.last_error = None;
            (was_open, panel.keystrokes.take())
        };
        drop(keystrokes);

        self.controller.unmount().await;
        if was_open {
            info!("scanner closed");
        }
    }

    /// User stop: turn the camera off and emit `Closed` once it is down.
    pub async fn stop(&self) -> ControlOutcome {
        let outcome = self.controller.stop().await;
        if outcome.is_done() {
            self.events.closed();
        }
        outcome
    }

    /// Switch to a concrete device.
    pub async fn select_device(&self, id: impl Into<String>) -> ControlOutcome {
        self.switch(CaptureTarget::Device(id.into())).await
    }

    /// Switch to the camera facing the given way.
    pub async fn select_facing(&self, facing: Facing) -> ControlOutcome {
        self.switch(CaptureTarget::Facing(facing)).await
    }

    async fn switch(&self, target: CaptureTarget) -> ControlOutcome {
        let outcome = self.controller.switch_to(target.clone()).await;
        if outcome == ControlOutcome::Busy {
            self.events.error(SWITCH_IN_PROGRESS);
        } else {
            self.record(&outcome, &target, true);
        }
        outcome
    }

    /// Try the failed target again.
    pub async fn retry(&self) -> ControlOutcome {
        let outcome = self.controller.retry().await;
        if let Some(target) = self.controller.target() {
            self.record(&outcome, &target, true);
        }
        outcome
    }

    fn record(&self, outcome: &ControlOutcome, target: &CaptureTarget, remember: bool) {
        let mut panel = self.panel();
        match outcome {
            ControlOutcome::Done => {
                panel.mode = Some(SelectionMode::of(target));
                panel.last_error = None;
                if remember {
                    panel.last_choice = Some(target.clone());
                }
            }
            ControlOutcome::Failed(reason) => panel.last_error = Some(reason.user_message()),
            _ => {}
        }
    }

    /// Emit typed text as a scan. Blank text is ignored.
    ///
    /// Works whether or not the panel is open and never touches the camera.
    pub fn submit_manual_text(&self, text: &str) -> bool {
        self.events.scan_text(text, ScanSource::Manual)
    }

    /// Forward a key press to the keystroke detector.
    ///
    /// Returns `false` when the panel is closed.
    pub fn press_key(&self, event: KeyEvent) -> bool {
        self.panel()
            .keystrokes
            .as_ref()
            .is_some_and(|keys| keys.feed(event))
    }

    pub fn is_open(&self) -> bool {
        self.panel().open
    }

    pub fn title(&self) -> Option<String> {
        self.panel().title.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// How long the camera has been in its current state.
    pub fn time_in_state(&self) -> Duration {
        self.controller.time_in_state()
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.panel().mode
    }

    /// Target of the last start or switch.
    pub fn current_target(&self) -> Option<CaptureTarget> {
        self.controller.target()
    }

    /// Remembered selection reused on the next open.
    pub fn last_choice(&self) -> Option<CaptureTarget> {
        self.panel().last_choice.clone()
    }

    /// Devices of the open panel.
    pub fn devices(&self) -> Vec<CaptureDevice> {
        self.panel()
            .catalog
            .as_ref()
            .map(|catalog| catalog.devices().to_vec())
            .unwrap_or_default()
    }

    /// Whether front/back selection is offered for the open panel.
    pub fn supports_facing(&self) -> bool {
        self.panel()
            .catalog
            .as_ref()
            .is_some_and(DeviceCatalog::supports_facing)
    }

    /// Last user-facing error of the open panel.
    pub fn last_error(&self) -> Option<String> {
        self.panel().last_error.clone()
    }

    /// Session transitions recorded since the panel opened.
    pub fn history(&self) -> Vec<SessionTransition> {
        self.controller.history()
    }
}
