//! Enum wrappers for camera platform dispatch.
//!
//! Native `async fn` in traits (RPITIT) are not object-safe, so
//! `Box<dyn CameraPlatform>` is not an option. The enums in this module give
//! concrete type dispatch instead, and leave room for feature-gated real
//! backends next to the mock.
//!
//! # Examples
//!
//! ```
//! use tillscan_hardware::devices::AnyCameraPlatform;
//! use tillscan_hardware::mock::MockCamera;
//!
//! let (camera, _handle) = MockCamera::new();
//! let platform = AnyCameraPlatform::Mock(camera);
//! ```

use crate::mock::{MockCamera, MockSession};
use crate::traits::{CameraPlatform, DecodeCallback};
use crate::{CaptureDevice, CaptureTarget, PlatformError, Result};

/// Enum wrapper for camera platform dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyCameraPlatform {
    /// Mock camera for development and testing.
    Mock(MockCamera),
}

/// Session handle matching [`AnyCameraPlatform`].
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySession {
    /// Session opened by a mock camera.
    Mock(MockSession),
}

impl CameraPlatform for AnyCameraPlatform {
    type Session = AnySession;

    async fn list_devices(&self) -> Result<Vec<CaptureDevice>> {
        match self {
            Self::Mock(platform) => platform.list_devices().await,
        }
    }

    fn surface_attached(&self) -> bool {
        match self {
            Self::Mock(platform) => platform.surface_attached(),
        }
    }

    async fn acquire(&self, target: &CaptureTarget, sink: DecodeCallback) -> Result<AnySession> {
        match self {
            Self::Mock(platform) => platform.acquire(target, sink).await.map(AnySession::Mock),
        }
    }

    async fn release(&self, session: AnySession) -> Result<()> {
        match (self, session) {
            (Self::Mock(platform), AnySession::Mock(session)) => platform.release(session).await,
            #[allow(unreachable_patterns)]
            _ => Err(PlatformError::other("session belongs to a different platform")),
        }
    }
}
