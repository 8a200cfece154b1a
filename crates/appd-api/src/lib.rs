//! Shared domain types for appd
//!
//! This crate defines the vocabulary shared between the supervisor, its
//! collaborators, and the telemetry transport:
//! - App categories and their arbitration tables
//! - Manual control values as stored in the parameter store
//! - Thermal status and telemetry samples

mod telemetry;
mod types;

pub use telemetry::*;
pub use types::*;
