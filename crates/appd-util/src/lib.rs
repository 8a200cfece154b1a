//! Shared utilities for appd
//!
//! This crate provides:
//! - ID types (AppId, PublisherId)
//! - Time utilities (monotonic time, the startup grace gate)
//! - Error types
//! - Command output truncation for failure records
//! - Default paths for config, params, and the telemetry socket

mod error;
mod ids;
mod output;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use output::*;
pub use paths::*;
pub use time::*;
