//! Camera platform abstraction layer for tillscan.
//!
//! This crate provides the trait-based seam between the barcode scanner and
//! the platform that owns the camera. Optical recognition stays on the
//! platform side; this layer only describes how devices are enumerated, how a
//! decode session is opened and released, and how decoded payloads flow back.
//!
//! # Design Philosophy
//!
//! - **Async-first**: platform calls are asynchronous and return `Send`
//!   futures (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: the [`CameraPlatform`] trait is not object-safe, so
//!   runtime selection goes through [`AnyCameraPlatform`].
//! - **Error-aware**: every operation returns [`Result<T>`][error::Result]
//!   with a [`PlatformError`] describing what the platform reported.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tillscan_hardware::traits::{CameraPlatform, DecodeSink};
//! use tillscan_hardware::types::{CaptureTarget, DecodeFrame};
//! use tillscan_hardware::error::Result;
//!
//! struct Log;
//!
//! impl DecodeSink for Log {
//!     fn on_frame(&self, frame: DecodeFrame) {
//!         if let DecodeFrame::Decoded(text) = frame {
//!             println!("{text}");
//!         }
//!     }
//! }
//!
//! async fn open_first<P: CameraPlatform>(platform: &P) -> Result<P::Session> {
//!     let devices = platform.list_devices().await?;
//!     let first = devices.first().map(|d| d.id.clone()).unwrap_or_default();
//!     platform.acquire(&CaptureTarget::Device(first), Arc::new(Log)).await
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`MockCamera`](mock::MockCamera) simulates a platform with scripted
//! devices, delays, and failures for development and testing.
//!
//! [`CameraPlatform`]: traits::CameraPlatform
//! [`AnyCameraPlatform`]: devices::AnyCameraPlatform

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{PlatformError, Result};
pub use traits::{CameraPlatform, DecodeCallback, DecodeSink};
pub use types::{CaptureDevice, CaptureTarget, DecodeFrame, Facing};

pub use devices::{AnyCameraPlatform, AnySession};
