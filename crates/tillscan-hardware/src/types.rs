//! Common types shared across camera platform implementations.
//!
//! This module defines capture device descriptions, the logical facing
//! selector, and the target an acquire is asked to open.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label/id fragments identifying a front (user-facing) camera.
const FRONT_HINTS: &[&str] = &["front", "user"];

/// Label/id fragments identifying a back (environment-facing) camera.
const BACK_HINTS: &[&str] = &["back", "environment"];

/// A capture device as enumerated by the platform.
///
/// Supplied by the platform and treated as read-only. The label is what the
/// OS reports (e.g. "Back Camera", "HD Webcam (046d:0825)").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureDevice {
    /// Platform device identifier.
    pub id: String,

    /// Human-readable device label.
    pub label: String,
}

impl CaptureDevice {
    /// Create a new capture device description.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Guess which way the camera faces from its label and id.
    ///
    /// Matching is a case-insensitive substring test. Front hints win when a
    /// label somehow contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// use tillscan_hardware::types::{CaptureDevice, Facing};
    ///
    /// assert_eq!(CaptureDevice::new("0", "Back Camera").facing(), Some(Facing::Back));
    /// assert_eq!(CaptureDevice::new("1", "camera2 1, facing front").facing(), Some(Facing::Front));
    /// assert_eq!(CaptureDevice::new("2", "HD Webcam").facing(), None);
    /// ```
    pub fn facing(&self) -> Option<Facing> {
        let haystack = format!("{} {}", self.label, self.id).to_lowercase();
        if FRONT_HINTS.iter().any(|hint| haystack.contains(hint)) {
            Some(Facing::Front)
        } else if BACK_HINTS.iter().any(|hint| haystack.contains(hint)) {
            Some(Facing::Back)
        } else {
            None
        }
    }
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.id)
    }
}

/// Logical camera orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// User-facing camera.
    Front,

    /// Environment-facing camera.
    Back,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" | "user" => Ok(Self::Front),
            "back" | "environment" => Ok(Self::Back),
            other => Err(format!("unknown facing: {other}")),
        }
    }
}

/// What a capture session should be opened against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTarget {
    /// A concrete device by platform id.
    Device(String),

    /// Whichever camera faces this way.
    Facing(Facing),
}

impl CaptureTarget {
    /// Target a specific device.
    pub fn device(id: impl Into<String>) -> Self {
        Self::Device(id.into())
    }

    /// Get the device id if this targets a concrete device.
    pub fn as_device(&self) -> Option<&str> {
        match self {
            Self::Device(id) => Some(id),
            Self::Facing(_) => None,
        }
    }
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "device {id}"),
            Self::Facing(facing) => write!(f, "{facing} camera"),
        }
    }
}

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFrame {
    /// A code was found in the frame.
    Decoded(String),

    /// No code in this frame. Expected at high frequency.
    Miss,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Front Camera", "0", Some(Facing::Front))]
    #[case("FaceTime HD (user)", "1", Some(Facing::Front))]
    #[case("Back Camera", "2", Some(Facing::Back))]
    #[case("camera 0, facing environment", "3", Some(Facing::Back))]
    #[case("", "back-cam", Some(Facing::Back))]
    #[case("HD Webcam C920", "046d:082d", None)]
    #[case("", "", None)]
    fn test_device_facing(
        #[case] label: &str,
        #[case] id: &str,
        #[case] expected: Option<Facing>,
    ) {
        assert_eq!(CaptureDevice::new(id, label).facing(), expected);
    }

    #[test]
    fn test_facing_parse() {
        assert_eq!("front".parse::<Facing>(), Ok(Facing::Front));
        assert_eq!(" Environment ".parse::<Facing>(), Ok(Facing::Back));
        assert!("sideways".parse::<Facing>().is_err());
    }

    #[test]
    fn test_capture_target_accessors() {
        let target = CaptureTarget::device("cam-1");
        assert_eq!(target.as_device(), Some("cam-1"));
        assert_eq!(target.to_string(), "device cam-1");

        let target = CaptureTarget::Facing(Facing::Back);
        assert_eq!(target.as_device(), None);
        assert_eq!(target.to_string(), "back camera");
    }

    #[test]
    fn test_capture_target_serialization() {
        let target = CaptureTarget::Facing(Facing::Front);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"facing":"front"}"#);
        let back: CaptureTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }
}
