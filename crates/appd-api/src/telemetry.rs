//! Vehicle telemetry samples

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Device thermal status, ordered from coolest to hottest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStatus {
    Green,
    Yellow,
    Red,
    Danger,
}

impl ThermalStatus {
    /// Hottest status at which automatic runs are (re)allowed
    pub const AUTO_RUN_CEILING: ThermalStatus = ThermalStatus::Yellow;

    /// Coolest status at which automatic runs are blocked
    pub const AUTO_RUN_BLOCK: ThermalStatus = ThermalStatus::Red;

    pub fn allows_auto_run(self) -> bool {
        self <= Self::AUTO_RUN_CEILING
    }

    pub fn blocks_auto_run(self) -> bool {
        self >= Self::AUTO_RUN_BLOCK
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThermalStatus::Green => "green",
            ThermalStatus::Yellow => "yellow",
            ThermalStatus::Red => "red",
            ThermalStatus::Danger => "danger",
        }
    }
}

impl fmt::Display for ThermalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown thermal status '{0}' (expected green, yellow, red or danger)")]
pub struct ParseThermalStatusError(String);

impl FromStr for ThermalStatus {
    type Err = ParseThermalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "0" => Ok(ThermalStatus::Green),
            "yellow" | "1" => Ok(ThermalStatus::Yellow),
            "red" | "2" => Ok(ThermalStatus::Red),
            "danger" | "3" => Ok(ThermalStatus::Danger),
            _ => Err(ParseThermalStatusError(s.to_string())),
        }
    }
}

/// One telemetry sample from the vehicle stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Vehicle ignition/started state
    pub started: bool,

    #[serde(alias = "thermalStatus")]
    pub thermal_status: ThermalStatus,
}

impl TelemetrySample {
    pub fn new(started: bool, thermal_status: ThermalStatus) -> Self {
        Self {
            started,
            thermal_status,
        }
    }

    pub fn started(thermal_status: ThermalStatus) -> Self {
        Self::new(true, thermal_status)
    }

    pub fn stopped(thermal_status: ThermalStatus) -> Self {
        Self::new(false, thermal_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermal_ordering_matches_levels() {
        assert!(ThermalStatus::Green < ThermalStatus::Yellow);
        assert!(ThermalStatus::Yellow < ThermalStatus::Red);
        assert!(ThermalStatus::Red < ThermalStatus::Danger);
    }

    #[test]
    fn thresholds() {
        assert!(ThermalStatus::Green.allows_auto_run());
        assert!(ThermalStatus::Yellow.allows_auto_run());
        assert!(!ThermalStatus::Red.allows_auto_run());
        assert!(ThermalStatus::Red.blocks_auto_run());
        assert!(ThermalStatus::Danger.blocks_auto_run());
        assert!(!ThermalStatus::Yellow.blocks_auto_run());
    }

    #[test]
    fn parse_thermal_status() {
        assert_eq!("Yellow".parse::<ThermalStatus>().unwrap(), ThermalStatus::Yellow);
        assert_eq!("2".parse::<ThermalStatus>().unwrap(), ThermalStatus::Red);
        assert!("purple".parse::<ThermalStatus>().is_err());
    }

    #[test]
    fn sample_accepts_camel_case_field() {
        let sample: TelemetrySample =
            serde_json::from_str(r#"{"started":true,"thermalStatus":"red"}"#).unwrap();
        assert_eq!(sample, TelemetrySample::started(ThermalStatus::Red));

        let sample: TelemetrySample =
            serde_json::from_str(r#"{"started":false,"thermal_status":"green"}"#).unwrap();
        assert_eq!(sample, TelemetrySample::stopped(ThermalStatus::Green));
    }
}
