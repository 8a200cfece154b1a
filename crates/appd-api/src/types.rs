//! App categories and manual control

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a lifecycle command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Run,
    Kill,
}

/// App category; determines how the supervisor arbitrates an app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    /// Navigation app auto-run while driving
    Gps,
    /// Background service started with the vehicle
    Service,
    /// Background service that also provides mock locations
    GpsService,
    /// App that takes over the screen and suppresses GPS/utility apps
    Fullscreen,
    /// Utility app only run on demand, killed when the vehicle starts
    Utility,
}

/// Per-category arbitration rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRules {
    /// Started with `am startservice` rather than `am start`
    pub service_start: bool,
    /// Holds the mock-location operation mode while running
    pub mock_location: bool,
    /// One-shot action on the stopped -> started edge
    pub on_vehicle_start: Option<Direction>,
    /// Action while any fullscreen app is enabled and the vehicle is started
    pub under_fullscreen: Option<Direction>,
    /// Eligible for automatic start once the start delay has passed
    pub auto_run: bool,
}

const GPS_RULES: CategoryRules = CategoryRules {
    service_start: false,
    mock_location: false,
    on_vehicle_start: None,
    under_fullscreen: Some(Direction::Kill),
    auto_run: true,
};

const SERVICE_RULES: CategoryRules = CategoryRules {
    service_start: true,
    mock_location: false,
    on_vehicle_start: Some(Direction::Run),
    under_fullscreen: None,
    auto_run: false,
};

const GPS_SERVICE_RULES: CategoryRules = CategoryRules {
    service_start: true,
    mock_location: true,
    on_vehicle_start: Some(Direction::Run),
    under_fullscreen: None,
    auto_run: false,
};

const FULLSCREEN_RULES: CategoryRules = CategoryRules {
    service_start: false,
    mock_location: false,
    on_vehicle_start: None,
    under_fullscreen: Some(Direction::Run),
    auto_run: false,
};

const UTILITY_RULES: CategoryRules = CategoryRules {
    service_start: false,
    mock_location: false,
    on_vehicle_start: Some(Direction::Kill),
    under_fullscreen: Some(Direction::Kill),
    auto_run: false,
};

impl AppCategory {
    pub const ALL: [AppCategory; 5] = [
        AppCategory::Gps,
        AppCategory::Service,
        AppCategory::GpsService,
        AppCategory::Fullscreen,
        AppCategory::Utility,
    ];

    /// Arbitration rules for this category
    pub const fn rules(self) -> &'static CategoryRules {
        match self {
            AppCategory::Gps => &GPS_RULES,
            AppCategory::Service => &SERVICE_RULES,
            AppCategory::GpsService => &GPS_SERVICE_RULES,
            AppCategory::Fullscreen => &FULLSCREEN_RULES,
            AppCategory::Utility => &UTILITY_RULES,
        }
    }

    pub fn is_fullscreen(self) -> bool {
        self == AppCategory::Fullscreen
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppCategory::Gps => "gps",
            AppCategory::Service => "service",
            AppCategory::GpsService => "gps_service",
            AppCategory::Fullscreen => "fullscreen",
            AppCategory::Utility => "utility",
        }
    }
}

impl fmt::Display for AppCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manual control request as stored in the parameter store
///
/// Stored values: `"-1"` (off), `"0"` (idle), `"1"` (on). Anything else,
/// including a missing key, reads as idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualControl {
    Off,
    #[default]
    Idle,
    On,
}

impl ManualControl {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => ManualControl::On,
            Some("-1") => ManualControl::Off,
            _ => ManualControl::Idle,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            ManualControl::Off => "-1",
            ManualControl::Idle => "0",
            ManualControl::On => "1",
        }
    }

    /// The command this request asks for, if any
    pub fn direction(self) -> Option<Direction> {
        match self {
            ManualControl::On => Some(Direction::Run),
            ManualControl::Off => Some(Direction::Kill),
            ManualControl::Idle => None,
        }
    }
}
