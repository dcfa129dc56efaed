use crate::{Result, error::Error};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded barcode text (trimmed, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScanText(String);

impl ScanText {
    /// Create scan text from raw input.
    ///
    /// Surrounding whitespace is removed before validation.
    ///
    /// # Errors
    /// Returns `Error::EmptyPayload` if nothing is left after trimming.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyPayload);
        }
        Ok(ScanText(trimmed.to_string()))
    }

    /// Get the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ScanText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanText {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ScanText::new(s)
    }
}

impl TryFrom<String> for ScanText {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ScanText::new(&value)
    }
}

impl From<ScanText> for String {
    fn from(text: ScanText) -> Self {
        text.0
    }
}

/// Input channel a scan arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    /// Optical decode from a capture session.
    Camera,
    /// Keystroke burst from a keyboard-wedge scanner.
    Keystroke,
    /// Text typed into the manual entry field.
    Manual,
}

impl ScanSource {
    /// Returns `true` if the scan came from the camera.
    #[inline]
    #[must_use]
    pub fn is_camera(self) -> bool {
        matches!(self, ScanSource::Camera)
    }

    /// Returns `true` if the scan came from a keystroke burst.
    #[inline]
    #[must_use]
    pub fn is_keystroke(self) -> bool {
        matches!(self, ScanSource::Keystroke)
    }

    /// Returns `true` if the scan was typed manually.
    #[inline]
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, ScanSource::Manual)
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanSource::Camera => write!(f, "Camera"),
            ScanSource::Keystroke => write!(f, "Keystroke"),
            ScanSource::Manual => write!(f, "Manual"),
        }
    }
}

/// A single recognized code, regardless of which channel produced it.
///
/// Downstream consumers only need [`text`](ScanEvent::text); the source is
/// informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub text: ScanText,
    pub source: ScanSource,
    pub scanned_at: DateTime<Local>,
}

impl ScanEvent {
    /// Build an event from raw text, stamped with the current local time.
    ///
    /// Returns `None` if the text is blank.
    #[must_use]
    pub fn new(raw: &str, source: ScanSource) -> Option<Self> {
        let text = ScanText::new(raw).ok()?;
        Some(ScanEvent {
            text,
            source,
            scanned_at: Local::now(),
        })
    }

    /// Get the scanned text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.source)
    }
}
