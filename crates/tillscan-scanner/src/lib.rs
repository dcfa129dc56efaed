//! Barcode input for tillscan.
//!
//! This crate turns three input channels into one stream of scans:
//!
//! - the device camera, driven through a platform's decoder by the
//!   [`SessionController`](session::SessionController);
//! - a hardware barcode scanner acting as a keyboard, recognised by
//!   keystroke timing in [`keystroke`];
//! - manual text entry.
//!
//! [`BarcodeInput`] is the entry point. It owns the panel lifecycle and
//! reports everything through [`ScannerEvents`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod keystroke;
pub mod session;
pub mod state;

pub use catalog::{DeviceCatalog, SelectionMode};
pub use config::{KeystrokeConfig, ScannerConfig, SessionTiming};
pub use error::{AcquireError, CatalogError};
pub use events::{ScannerEvent, ScannerEvents};
pub use facade::{BarcodeInput, SWITCH_IN_PROGRESS};
pub use keystroke::{Key, KeyEvent, KeystrokeDetector, Modifiers};
pub use session::{ControlOutcome, InFlight, SessionController};
pub use state::{SessionMachine, SessionState, SessionTransition};

// Shared domain types, so hosts need only this crate.
pub use tillscan_core::{ScanEvent, ScanSource};
