//! Shared types for tillscan: scan payloads, their source channel, and the
//! timing defaults the scanner falls back to.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
