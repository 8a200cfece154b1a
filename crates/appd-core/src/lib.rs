//! App lifecycle supervisor for appd
//!
//! This crate is the heart of appd, containing:
//! - Per-app records (enablement, install state, run/kill dispatch, manual override)
//! - Session timers (start/stop delays, thermal hysteresis)
//! - The supervisor cycle and its cross-app arbitration
//! - Events describing every dispatched action
//! - The daemon loop driver gating construction on the startup grace

mod app;
mod events;
mod runner;
mod session;
mod supervisor;

pub use app::*;
pub use events::*;
pub use runner::*;
pub use session::*;
pub use supervisor::*;
