//! Scanner configuration.
//!
//! Every timing and threshold the scanner uses lives here. Durations are
//! written as whole milliseconds in serialized form:
//!
//! ```json
//! {
//!   "keystroke": { "debounce_ms": 100, "min_length": 4 },
//!   "timing": { "settle_delay_ms": 300, "stabilize_delay_ms": 150 },
//!   "camera_repeat_cooldown_ms": 0
//! }
//! ```
//!
//! Missing fields fall back to the defaults in
//! [`tillscan_core::constants`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tillscan_core::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_SCAN_LENGTH, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_STABILIZE_DELAY_MS,
};
use tillscan_core::{Error, Result};

/// Keystroke burst detection settings.
///
/// A fast paste of `min_length` or more characters inside the debounce
/// window is indistinguishable from a scanner and will be emitted as a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystrokeConfig {
    /// Quiet period that ends a burst.
    #[serde(rename = "debounce_ms", with = "duration_ms")]
    pub debounce: Duration,

    /// Shortest burst emitted on debounce expiry.
    pub min_length: usize,
}

impl Default for KeystrokeConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_length: DEFAULT_MIN_SCAN_LENGTH,
        }
    }
}

/// Camera session timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    /// Pause between stopping the old session and starting the new one
    /// during a switch.
    #[serde(rename = "settle_delay_ms", with = "duration_ms")]
    pub settle_delay: Duration,

    /// Pause after a successful acquire before the session is active.
    #[serde(rename = "stabilize_delay_ms", with = "duration_ms")]
    pub stabilize_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            stabilize_delay: Duration::from_millis(DEFAULT_STABILIZE_DELAY_MS),
        }
    }
}

/// Top-level scanner configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tillscan_scanner::ScannerConfig;
///
/// let config = ScannerConfig::default()
///     .with_debounce(Duration::from_millis(60))
///     .with_min_length(6);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.keystroke.min_length, 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub keystroke: KeystrokeConfig,

    pub timing: SessionTiming,

    /// Drop an identical camera payload seen again within this window.
    /// Zero disables the check.
    #[serde(rename = "camera_repeat_cooldown_ms", with = "duration_ms")]
    pub camera_repeat_cooldown: Duration,
}

impl ScannerConfig {
    /// Set the keystroke debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.keystroke.debounce = debounce;
        self
    }

    /// Set the minimum keystroke burst length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.keystroke.min_length = min_length;
        self
    }

    /// Set the switch settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.timing.settle_delay = delay;
        self
    }

    /// Set the post-acquire stabilization delay.
    pub fn with_stabilize_delay(mut self, delay: Duration) -> Self {
        self.timing.stabilize_delay = delay;
        self
    }

    /// Set the repeat cooldown for identical camera payloads.
    pub fn with_camera_repeat_cooldown(mut self, cooldown: Duration) -> Self {
        self.camera_repeat_cooldown = cooldown;
        self
    }

    /// Check the configuration for values the scanner cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the debounce window is zero or the minimum
    /// burst length is zero.
    pub fn validate(&self) -> Result<()> {
        if self.keystroke.debounce.is_zero() {
            return Err(Error::Config("keystroke debounce must be non-zero".into()));
        }
        if self.keystroke.min_length == 0 {
            return Err(Error::Config(
                "keystroke min_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.keystroke.debounce, Duration::from_millis(100));
        assert_eq!(config.keystroke.min_length, 4);
        assert_eq!(config.timing.settle_delay, Duration::from_millis(300));
        assert_eq!(config.timing.stabilize_delay, Duration::from_millis(150));
        assert!(config.camera_repeat_cooldown.is_zero());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = ScannerConfig::default()
            .with_settle_delay(Duration::from_millis(500))
            .with_camera_repeat_cooldown(Duration::from_millis(1500));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timing"]["settle_delay_ms"], 500);
        assert_eq!(json["camera_repeat_cooldown_ms"], 1500);

        let back: ScannerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{ "keystroke": { "min_length": 8 } }"#).unwrap();
        assert_eq!(config.keystroke.min_length, 8);
        assert_eq!(config.keystroke.debounce, Duration::from_millis(100));
        assert_eq!(config.timing, SessionTiming::default());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = ScannerConfig::default().with_debounce(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ScannerConfig::default().with_min_length(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
