//! Error types for appd

use thiserror::Error;

use crate::AppId;

/// Core error type for appd operations
#[derive(Debug, Error)]
pub enum AppdError {
    #[error("App not found: {0}")]
    AppNotFound(AppId),

    #[error("Duplicate app: {0}")]
    DuplicateApp(AppId),
}

pub type Result<T> = std::result::Result<T, AppdError>;
