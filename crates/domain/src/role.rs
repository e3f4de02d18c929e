//! Roles: which quantity a group address carries, and in which direction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datapoint::Datapoint;

/// Semantic tag attached to each address a device declares.
///
/// Write roles are the command targets; every other role is a status
/// address that reports the current value and answers read requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    PowerWrite,
    PowerStatus,
    PercentageWrite,
    PercentageStatus,
    CurrentTemperature,
    TargetTemperatureWrite,
    TargetTemperatureStatus,
    WindSpeed,
    LightIntensity,
    Rainfall,
    Lock,
}

impl Role {
    /// Every role, in catalog declaration order.
    pub const ALL: [Role; 11] = [
        Role::PowerWrite,
        Role::PowerStatus,
        Role::PercentageWrite,
        Role::PercentageStatus,
        Role::CurrentTemperature,
        Role::TargetTemperatureWrite,
        Role::TargetTemperatureStatus,
        Role::WindSpeed,
        Role::LightIntensity,
        Role::Rainfall,
        Role::Lock,
    ];

    /// Datapoint format carried by telegrams on addresses of this role.
    #[must_use]
    pub fn datapoint(self) -> Datapoint {
        match self {
            Self::PowerWrite | Self::PowerStatus | Self::Rainfall | Self::Lock => Datapoint::Switch,
            Self::PercentageWrite | Self::PercentageStatus => Datapoint::Scaling,
            Self::CurrentTemperature
            | Self::TargetTemperatureWrite
            | Self::TargetTemperatureStatus
            | Self::WindSpeed
            | Self::LightIntensity => Datapoint::Float16,
        }
    }

    /// Whether this role is a command target.
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::PowerWrite | Self::PercentageWrite | Self::TargetTemperatureWrite
        )
    }

    /// Whether the address reports a value that can be requested with a read.
    #[must_use]
    pub fn is_readable(self) -> bool {
        !self.is_write()
    }

    /// Stable kebab-case name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerWrite => "power-write",
            Self::PowerStatus => "power-status",
            Self::PercentageWrite => "percentage-write",
            Self::PercentageStatus => "percentage-status",
            Self::CurrentTemperature => "current-temperature",
            Self::TargetTemperatureWrite => "target-temperature-write",
            Self::TargetTemperatureStatus => "target-temperature-status",
            Self::WindSpeed => "wind-speed",
            Self::LightIntensity => "light-intensity",
            Self::Rainfall => "rainfall",
            Self::Lock => "lock",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
