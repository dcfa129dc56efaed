//! Error types for camera platform operations.
//!
//! This module defines the failures a capture platform can report while
//! enumerating devices, acquiring a decode session, or releasing one. The
//! scanner maps these onto user-facing categories; this layer stays close to
//! what the platform actually said.

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Message fragments that identify a teardown of a session that was not
/// running. Matched case-insensitively against [`PlatformError::Other`].
const BENIGN_TEARDOWN_HINTS: &[&str] = &[
    "not running",
    "already stopped",
    "not started",
    "no active session",
    "not scanning",
];

/// Errors reported by a camera platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The user or the OS refused camera access.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// The requested device does not exist or no camera is present.
    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    /// The preview surface the session renders into is missing.
    #[error("Preview surface missing")]
    ContainerMissing,

    /// Teardown requested for a session that already stopped.
    #[error("Session already stopped")]
    AlreadyStopped,

    /// Teardown requested while nothing is running.
    #[error("No session running")]
    NotRunning,

    /// Anything else, with the platform's own message.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Create a new permission denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new device not found error.
    pub fn device_not_found(device: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device: device.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error, returned from a teardown, only means the session
    /// was already inactive.
    ///
    /// # Examples
    ///
    /// ```
    /// use tillscan_hardware::PlatformError;
    ///
    /// assert!(PlatformError::NotRunning.is_benign_teardown());
    /// assert!(PlatformError::other("Cannot stop, scanner is not running").is_benign_teardown());
    /// assert!(!PlatformError::other("driver crashed").is_benign_teardown());
    /// ```
    pub fn is_benign_teardown(&self) -> bool {
        match self {
            Self::AlreadyStopped | Self::NotRunning => true,
            Self::Other(message) => {
                let message = message.to_lowercase();
                BENIGN_TEARDOWN_HINTS
                    .iter()
                    .any(|hint| message.contains(hint))
            }
            _ => false,
        }
    }
}
