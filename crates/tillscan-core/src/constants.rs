//! Default timings and thresholds for barcode input.
//!
//! These values are the defaults used by the scanner configuration. Every one
//! of them can be overridden at runtime; the constants only exist so the
//! defaults live in one place.
//!
//! # Keystroke detection
//!
//! A hardware scanner emits a whole code within a few milliseconds per
//! character, while a person cannot sustain keystrokes inside the debounce
//! window. A burst that reaches [`DEFAULT_MIN_SCAN_LENGTH`] characters before
//! a quiet period of [`DEFAULT_DEBOUNCE_MS`] is treated as a scan.
//!
//! ```
//! use tillscan_core::constants::*;
//! use std::time::Duration;
//!
//! let debounce = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
//! assert!(debounce < Duration::from_millis(DEFAULT_SETTLE_DELAY_MS));
//! ```

// ============================================================================
// Keystroke Detection
// ============================================================================

/// Quiet period after which a buffered keystroke burst is considered complete.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Minimum burst length that counts as a scanner emission on debounce expiry.
///
/// Shorter bursts are assumed to be ordinary typing and are discarded.
/// Bursts terminated with Enter are emitted regardless of length.
pub const DEFAULT_MIN_SCAN_LENGTH: usize = 4;

/// Capacity of the key event channel feeding the detector task.
pub const KEY_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Camera Session Timing
// ============================================================================

/// Pause between stopping one capture session and starting the next.
///
/// Many platforms misbehave if a new session is requested while the previous
/// one is still releasing the camera.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 300;

/// Pause after a successful acquire before the session is reported active.
pub const DEFAULT_STABILIZE_DELAY_MS: u64 = 150;

/// Number of session state transitions kept for diagnostics.
pub const MAX_SESSION_HISTORY: usize = 64;
