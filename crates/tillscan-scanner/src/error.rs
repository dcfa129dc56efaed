//! User-facing failure categories.
//!
//! Platform errors are mapped onto a small fixed set of categories so callers
//! and tests can reason about *what kind* of failure happened. Each category
//! has exactly one display string; only the unknown categories carry the
//! platform's own message as a diagnostic suffix.

use thiserror::Error;
use tillscan_hardware::PlatformError;

/// Why the device list could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("No camera was found on this device.")]
    NoDeviceFound,

    #[error("Camera permission was denied. Allow camera access to scan barcodes.")]
    PermissionDenied,

    #[error("Unable to list cameras: {0}")]
    Platform(String),
}

impl CatalogError {
    /// Text to show the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<PlatformError> for CatalogError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::PermissionDenied { .. } => Self::PermissionDenied,
            PlatformError::DeviceNotFound { .. } => Self::NoDeviceFound,
            other => Self::Platform(other.to_string()),
        }
    }
}

/// Why a capture session could not be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("Camera permission was denied. Allow camera access and try again.")]
    PermissionDenied,

    #[error("The selected camera could not be found. Choose another camera and try again.")]
    DeviceNotFound,

    #[error("The camera preview is not available. Close the scanner and open it again.")]
    ContainerMissing,

    #[error("Could not start the camera: {0}")]
    Unknown(String),
}

impl AcquireError {
    /// Text to show the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<PlatformError> for AcquireError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::PermissionDenied { .. } => Self::PermissionDenied,
            PlatformError::DeviceNotFound { .. } => Self::DeviceNotFound,
            PlatformError::ContainerMissing => Self::ContainerMissing,
            other => Self::Unknown(other.to_string()),
        }
    }
}
