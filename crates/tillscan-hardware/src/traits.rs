//! Camera platform trait definitions.
//!
//! This module defines the contract between the scanner and whatever actually
//! owns the camera: a V4L2 pipeline, a webview bridge, or the mock used in
//! tests. The platform enumerates devices, opens decode sessions, and tears
//! them down. Optical recognition happens on the platform side; decoded
//! payloads come back through a [`DecodeSink`].
//!
//! Methods return `impl Future + Send` (Edition 2024 RPITIT) so the scanner
//! can drive them from spawned Tokio tasks. Implementations may still write
//! them as plain `async fn`.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{CaptureDevice, CaptureTarget, DecodeFrame};

/// Receiver for per-frame decode results of one capture session.
///
/// The platform calls [`on_frame`](DecodeSink::on_frame) from whatever
/// context it decodes in. Implementations must be cheap and must not block.
/// A sink may outlive its session; late frames are the sink's problem, not
/// the platform's.
pub trait DecodeSink: Send + Sync {
    /// Deliver one frame result.
    fn on_frame(&self, frame: DecodeFrame);
}

/// Shared handle to a decode sink, as handed to [`CameraPlatform::acquire`].
pub type DecodeCallback = Arc<dyn DecodeSink>;

/// Camera platform abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because its methods return `impl Future`.
/// Use generic parameters, or the enum wrapper pattern from the
/// [`devices`](crate::devices) module for runtime selection:
///
/// ```no_run
/// use tillscan_hardware::devices::AnyCameraPlatform;
/// use tillscan_hardware::mock::MockCamera;
/// use tillscan_hardware::traits::CameraPlatform;
///
/// # async fn example() -> tillscan_hardware::Result<()> {
/// let (camera, _handle) = MockCamera::new();
/// let platform = AnyCameraPlatform::Mock(camera);
///
/// let devices = platform.list_devices().await?;
/// println!("{} camera(s)", devices.len());
/// # Ok(())
/// # }
/// ```
///
/// # Session lifecycle
///
/// ```no_run
/// use std::sync::Arc;
/// use tillscan_hardware::traits::{CameraPlatform, DecodeSink};
/// use tillscan_hardware::types::{CaptureTarget, DecodeFrame, Facing};
/// use tillscan_hardware::error::Result;
///
/// struct Print;
///
/// impl DecodeSink for Print {
///     fn on_frame(&self, frame: DecodeFrame) {
///         if let DecodeFrame::Decoded(text) = frame {
///             println!("scanned {text}");
///         }
///     }
/// }
///
/// async fn scan_once<P: CameraPlatform>(platform: &P) -> Result<()> {
///     let session = platform
///         .acquire(&CaptureTarget::Facing(Facing::Back), Arc::new(Print))
///         .await?;
///     platform.release(session).await
/// }
/// ```
pub trait CameraPlatform: Send + Sync + 'static {
    /// Live capture session handle.
    type Session: Send + 'static;

    /// Enumerate the capture devices currently available.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Camera access was refused
    /// - The platform has no camera support at all
    /// - The enumeration call itself failed
    fn list_devices(&self) -> impl Future<Output = Result<Vec<CaptureDevice>>> + Send;

    /// Whether the preview surface a session renders into exists and is
    /// attached right now.
    fn surface_attached(&self) -> bool;

    /// Open a decode session against `target`.
    ///
    /// Decoded payloads and misses are delivered to `sink` until the session
    /// is released.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Camera access was refused
    /// - The device does not exist
    /// - The preview surface is missing
    /// - Any other platform failure occurs
    fn acquire(
        &self,
        target: &CaptureTarget,
        sink: DecodeCallback,
    ) -> impl Future<Output = Result<Self::Session>> + Send;

    /// Stop a decode session and release the camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform reports a failure while stopping.
    /// "Already stopped" conditions are reported as errors too; callers
    /// decide whether they matter (see
    /// [`PlatformError::is_benign_teardown`](crate::PlatformError::is_benign_teardown)).
    fn release(&self, session: Self::Session) -> impl Future<Output = Result<()>> + Send;
}
