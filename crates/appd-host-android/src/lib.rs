//! Android host adapter for appd
//!
//! Provides:
//! - Shell command execution (`sh -c`) with captured output
//! - Installed version lookup through the package manager
//! - Update manifest for remote versions and APK locations
//! - Package install/update and uninstall

mod executor;
mod installer;
mod manifest;

pub use executor::*;
pub use installer::*;
pub use manifest::*;
