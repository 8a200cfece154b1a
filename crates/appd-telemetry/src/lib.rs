//! Telemetry transport for appd
//!
//! Provides:
//! - Unix domain socket server accepting any number of publishers
//! - NDJSON (newline-delimited JSON) samples
//! - A [`TelemetrySource`](appd_host_api::TelemetrySource) handing the
//!   latest sample to the supervisor
//! - Publisher client
//! - Peer credential logging

mod publisher;
mod server;

pub use publisher::*;
pub use server::*;

use thiserror::Error;

/// Telemetry transport errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    ServerError(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
