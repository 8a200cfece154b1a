//! Default paths for appd components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/appd/config.toml` or `~/.config/appd/config.toml`
//! - Params: `/data/params/d` on a device, else `$XDG_DATA_HOME/appd/params`
//! - Telemetry socket: `$XDG_RUNTIME_DIR/appd/telemetry.sock` or `/tmp/appd-$USER/telemetry.sock`

use std::path::{Path, PathBuf};

/// Environment variable for overriding the config file path
pub const APPD_CONFIG_ENV: &str = "APPD_CONFIG";

/// Environment variable for overriding the params directory
pub const APPD_PARAMS_DIR_ENV: &str = "APPD_PARAMS_DIR";

/// Environment variable for overriding the telemetry socket path
pub const APPD_TELEMETRY_SOCKET_ENV: &str = "APPD_TELEMETRY_SOCKET";

/// Params directory used by the vehicle stack on the device itself
pub const DEVICE_PARAMS_DIR: &str = "/data/params/d";

const CONFIG_FILENAME: &str = "config.toml";
const SOCKET_FILENAME: &str = "telemetry.sock";
const APP_DIR: &str = "appd";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$APPD_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/appd/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/appd/config.toml`
/// 4. `/etc/appd/config.toml` (no home directory)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(APPD_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default params directory.
///
/// Order of precedence:
/// 1. `$APPD_PARAMS_DIR` environment variable (if set)
/// 2. `/data/params/d` (if it exists)
/// 3. `$XDG_DATA_HOME/appd/params` or `~/.local/share/appd/params`
pub fn default_params_dir() -> PathBuf {
    if let Ok(path) = std::env::var(APPD_PARAMS_DIR_ENV) {
        return PathBuf::from(path);
    }

    if Path::new(DEVICE_PARAMS_DIR).is_dir() {
        return PathBuf::from(DEVICE_PARAMS_DIR);
    }

    params_dir_without_env()
}

/// Get the params directory without checking the environment override or the device path.
pub fn params_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR).join("params");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR)
            .join("params");
    }

    PathBuf::from("/tmp").join(APP_DIR).join("params")
}

/// Get the default telemetry socket path.
///
/// Order of precedence:
/// 1. `$APPD_TELEMETRY_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/appd/telemetry.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/appd-$USER/telemetry.sock` (fallback)
pub fn default_telemetry_socket() -> PathBuf {
    if let Ok(path) = std::env::var(APPD_TELEMETRY_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    telemetry_socket_without_env()
}

/// Get the telemetry socket path without checking APPD_TELEMETRY_SOCKET.
pub fn telemetry_socket_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}
