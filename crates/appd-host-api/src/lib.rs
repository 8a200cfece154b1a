//! Collaborator interfaces for appd
//!
//! This crate defines the boundary between the lifecycle supervisor and
//! everything it treats as external: the host command executor, the
//! parameter store, the package installer, and the telemetry source. It
//! contains no platform code itself, only the traits, the lifecycle command
//! lines, and in-memory mocks.

mod command;
pub mod lifecycle;
mod mock;
mod traits;

pub use command::*;
pub use mock::*;
pub use traits::*;
