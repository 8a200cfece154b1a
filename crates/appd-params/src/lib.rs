//! Parameter store for appd
//!
//! Parameters live in a flat directory shared with the rest of the vehicle
//! stack, one file per key. Provides:
//! - Reads that treat missing keys as absent
//! - Atomic writes (temp file + rename)
//! - A directory-level modification marker for change detection

mod store;

pub use store::*;

use thiserror::Error;

/// Parameter store errors
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Invalid parameter key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParamsError> for appd_host_api::HostError {
    fn from(e: ParamsError) -> Self {
        appd_host_api::HostError::Params(e.to_string())
    }
}

pub type ParamsResult<T> = Result<T, ParamsError>;
