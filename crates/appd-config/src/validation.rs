//! Configuration validation

use crate::schema::{RawApp, RawConfig, RawSupervisorConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("App '{package}': {message}")]
    AppError { package: String, message: String },

    #[error("Duplicate app package: {0}")]
    DuplicateApp(String),

    #[error("Parameter '{param}' is used by both '{first}' and '{second}'")]
    SharedManualParam {
        param: String,
        first: String,
        second: String,
    },

    #[error("Supervisor config error: {0}")]
    SupervisorError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_supervisor(&config.supervisor));

    // Check for duplicate packages
    let mut seen_packages = HashSet::new();
    for app in &config.apps {
        if !seen_packages.insert(&app.package) {
            errors.push(ValidationError::DuplicateApp(app.package.clone()));
        }
    }

    // Acknowledging a manual request clears the key, so it cannot be shared
    let mut manual_params: Vec<(&str, &str)> = Vec::new();
    for app in &config.apps {
        let Some(param) = app.manual_ctrl_param.as_deref() else {
            continue;
        };
        if let Some((_, first)) = manual_params.iter().find(|(p, _)| *p == param) {
            errors.push(ValidationError::SharedManualParam {
                param: param.to_string(),
                first: first.to_string(),
                second: app.package.clone(),
            });
        } else {
            manual_params.push((param, &app.package));
        }
    }

    for app in &config.apps {
        errors.extend(validate_app(app));
    }

    errors
}

fn validate_supervisor(supervisor: &RawSupervisorConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if supervisor.frame_step == Some(0) {
        errors.push(ValidationError::SupervisorError(
            "frame_step must be greater than zero".into(),
        ));
    }

    if supervisor.cycle_interval_seconds == Some(0) {
        errors.push(ValidationError::SupervisorError(
            "cycle_interval_seconds must be greater than zero".into(),
        ));
    }

    errors
}

fn validate_app(app: &RawApp) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut app_error = |message: &str| {
        errors.push(ValidationError::AppError {
            package: app.package.clone(),
            message: message.into(),
        });
    };

    if app.package.trim().is_empty() {
        app_error("package cannot be empty");
    } else if app.package.chars().any(char::is_whitespace) {
        app_error("package cannot contain whitespace");
    }

    if app.entry_point.trim().is_empty() {
        app_error("entry_point cannot be empty");
    }

    let params = [
        ("enable_param", &app.enable_param),
        ("auto_run_param", &app.auto_run_param),
        ("manual_ctrl_param", &app.manual_ctrl_param),
    ];
    for (name, value) in params {
        if let Some(key) = value {
            if !is_valid_param_key(key) {
                app_error(&format!("{} '{}' is not a valid parameter key", name, key));
            }
        }
    }

    if app.permissions.iter().any(|p| p.trim().is_empty()) {
        app_error("permissions cannot contain empty entries");
    }

    if app.app_ops.iter().any(|op| op.trim().is_empty()) {
        app_error("app_ops cannot contain empty entries");
    }

    errors
}

/// Parameter keys are file names in the params directory
pub fn is_valid_param_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}
