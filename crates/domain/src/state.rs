//! Device state: the latest known value of every quantity a device reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::datapoint::DatapointValue;
use crate::device::DeviceId;
use crate::error::ValidationError;
use crate::role::Role;

/// On/off state of a switchable device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

impl FromStr for PowerState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Self::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else {
            Err(ValidationError::InvalidPowerState(s.to_string()))
        }
    }
}

/// A single changed field of a [`DeviceState`].
///
/// Serializes as a one-entry map keyed by the field name, e.g.
/// `{"percentage": 50}`, so it can be flattened into history records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateChange {
    PowerState(PowerState),
    Percentage(u8),
    CurrentTemperature(f64),
    TargetTemperature(f64),
    WindSpeed(f64),
    LightIntensity(f64),
    Rainfall(bool),
    Locked(bool),
}

impl StateChange {
    /// Map a decoded status value onto the field it updates.
    ///
    /// Returns `None` for write roles and for values whose datapoint does not
    /// match the role.
    #[must_use]
    pub fn for_role(role: Role, value: DatapointValue) -> Option<Self> {
        match (role, value) {
            (Role::PowerStatus, DatapointValue::Switch(on)) => {
                Some(Self::PowerState(PowerState::from(on)))
            }
            (Role::PercentageStatus, DatapointValue::Scaling(percent)) => {
                Some(Self::Percentage(percent))
            }
            (Role::CurrentTemperature, DatapointValue::Float16(value)) => {
                Some(Self::CurrentTemperature(value))
            }
            (Role::TargetTemperatureStatus, DatapointValue::Float16(value)) => {
                Some(Self::TargetTemperature(value))
            }
            (Role::WindSpeed, DatapointValue::Float16(value)) => Some(Self::WindSpeed(value)),
            (Role::LightIntensity, DatapointValue::Float16(value)) => {
                Some(Self::LightIntensity(value))
            }
            (Role::Rainfall, DatapointValue::Switch(raining)) => Some(Self::Rainfall(raining)),
            (Role::Lock, DatapointValue::Switch(locked)) => Some(Self::Locked(locked)),
            _ => None,
        }
    }

    /// Name of the field this change carries.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::PowerState(_) => "powerState",
            Self::Percentage(_) => "percentage",
            Self::CurrentTemperature(_) => "currentTemperature",
            Self::TargetTemperature(_) => "targetTemperature",
            Self::WindSpeed(_) => "windSpeed",
            Self::LightIntensity(_) => "lightIntensity",
            Self::Rainfall(_) => "rainfall",
            Self::Locked(_) => "locked",
        }
    }

    /// Value as written to durable storage: booleans and power state as
    /// `1`/`0`, numbers in their shortest decimal form.
    #[must_use]
    pub fn value_text(&self) -> String {
        match self {
            Self::PowerState(state) => bit(state.is_on()),
            Self::Percentage(percent) => percent.to_string(),
            Self::CurrentTemperature(value)
            | Self::TargetTemperature(value)
            | Self::WindSpeed(value)
            | Self::LightIntensity(value) => value.to_string(),
            Self::Rainfall(flag) | Self::Locked(flag) => bit(*flag),
        }
    }

    /// Parse a persisted `(field, value)` pair back into a change.
    ///
    /// Returns `None` for unknown fields or malformed values.
    #[must_use]
    pub fn from_persisted(field: &str, value: &str) -> Option<Self> {
        let flag = || match value {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        };
        let number = || value.parse::<f64>().ok();
        match field {
            "powerState" => flag().map(|on| Self::PowerState(PowerState::from(on))),
            "percentage" => value.parse().ok().map(Self::Percentage),
            "currentTemperature" => number().map(Self::CurrentTemperature),
            "targetTemperature" => number().map(Self::TargetTemperature),
            "windSpeed" => number().map(Self::WindSpeed),
            "lightIntensity" => number().map(Self::LightIntensity),
            "rainfall" => flag().map(Self::Rainfall),
            "locked" => flag().map(Self::Locked),
            _ => None,
        }
    }
}

fn bit(flag: bool) -> String {
    String::from(if flag { "1" } else { "0" })
}

/// Latest known values of one device. Every field is absent until a first
/// reading arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<PowerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl DeviceState {
    /// Empty state for a device.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            power_state: None,
            percentage: None,
            current_temperature: None,
            target_temperature: None,
            wind_speed: None,
            light_intensity: None,
            rainfall: None,
            locked: None,
        }
    }

    /// Overwrite the field carried by `change`.
    pub fn apply(&mut self, change: StateChange) {
        match change {
            StateChange::PowerState(state) => self.power_state = Some(state),
            StateChange::Percentage(percent) => self.percentage = Some(percent),
            StateChange::CurrentTemperature(value) => self.current_temperature = Some(value),
            StateChange::TargetTemperature(value) => self.target_temperature = Some(value),
            StateChange::WindSpeed(value) => self.wind_speed = Some(value),
            StateChange::LightIntensity(value) => self.light_intensity = Some(value),
            StateChange::Rainfall(flag) => self.rainfall = Some(flag),
            StateChange::Locked(flag) => self.locked = Some(flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_id() -> DeviceId {
        DeviceId::new("living_room").unwrap()
    }

    #[test]
    fn should_parse_power_state_case_insensitively() {
        assert_eq!("ON".parse::<PowerState>().unwrap(), PowerState::On);
        assert_eq!("off".parse::<PowerState>().unwrap(), PowerState::Off);
        assert!(matches!(
            "toggle".parse::<PowerState>(),
            Err(ValidationError::InvalidPowerState(_))
        ));
    }

    #[test]
    fn should_map_status_roles_to_fields() {
        assert_eq!(
            StateChange::for_role(Role::PowerStatus, DatapointValue::Switch(true)),
            Some(StateChange::PowerState(PowerState::On))
        );
        assert_eq!(
            StateChange::for_role(Role::Lock, DatapointValue::Switch(false)),
            Some(StateChange::Locked(false))
        );
        assert_eq!(
            StateChange::for_role(Role::TargetTemperatureStatus, DatapointValue::Float16(21.5)),
            Some(StateChange::TargetTemperature(21.5))
        );
    }

    #[test]
    fn should_ignore_write_roles() {
        assert_eq!(
            StateChange::for_role(Role::PowerWrite, DatapointValue::Switch(true)),
            None
        );
        assert_eq!(
            StateChange::for_role(Role::PercentageWrite, DatapointValue::Scaling(10)),
            None
        );
    }

    #[test]
    fn should_serialize_change_as_single_field_map() {
        let json = serde_json::to_value(StateChange::PowerState(PowerState::On)).unwrap();
        assert_eq!(json, serde_json::json!({"powerState": "ON"}));
    }

    #[test]
    fn should_persist_booleans_as_bits() {
        assert_eq!(StateChange::PowerState(PowerState::Off).value_text(), "0");
        assert_eq!(StateChange::Rainfall(true).value_text(), "1");
        assert_eq!(StateChange::CurrentTemperature(21.5).value_text(), "21.5");
    }

    #[test]
    fn should_parse_persisted_pairs() {
        assert_eq!(
            StateChange::from_persisted("powerState", "1"),
            Some(StateChange::PowerState(PowerState::On))
        );
        assert_eq!(
            StateChange::from_persisted("percentage", "42"),
            Some(StateChange::Percentage(42))
        );
        assert_eq!(StateChange::from_persisted("locked", "yes"), None);
        assert_eq!(StateChange::from_persisted("humidity", "3"), None);
    }

    #[test]
    fn should_overwrite_field_on_apply() {
        let mut state = DeviceState::new(device_id());
        state.apply(StateChange::Percentage(10));
        state.apply(StateChange::Percentage(80));
        assert_eq!(state.percentage, Some(80));
        assert_eq!(state.power_state, None);
    }

    #[test]
    fn should_omit_absent_fields_when_serialized() {
        let mut state = DeviceState::new(device_id());
        state.apply(StateChange::PowerState(PowerState::On));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"deviceId": "living_room", "powerState": "ON"})
        );
    }
}
