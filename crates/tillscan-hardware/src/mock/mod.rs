//! Mock platform implementations for testing and development.
//!
//! This module provides a simulated camera platform that can be controlled
//! programmatically without requiring physical hardware.

pub mod camera;

// Re-export commonly used types
pub use camera::{MockCamera, MockCameraHandle, MockSession, PlatformCall};
