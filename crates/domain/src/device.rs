//! Device: a bus participant and the group addresses it declares per role.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::GroupAddress;
use crate::error::ValidationError;
use crate::role::Role;

/// Opaque, non-empty device identifier taken from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a catalog identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `id` is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

/// Kind of actuator or sensor a device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceClass {
    LightSwitch,
    Dimmer,
    RollerShutter,
    Heating,
}

/// A catalog device. Immutable once loaded.
///
/// Serializes as a flat record with one optional `ga…` key per role,
/// the same shape the catalog file uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeviceRecord", into = "DeviceRecord")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub class: DeviceClass,
    addresses: BTreeMap<Role, GroupAddress>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Address declared for `role`, if the device supports it.
    #[must_use]
    pub fn address(&self, role: Role) -> Option<GroupAddress> {
        self.addresses.get(&role).copied()
    }

    /// Every declared `(role, address)` pair in role order.
    pub fn addresses(&self) -> impl Iterator<Item = (Role, GroupAddress)> + '_ {
        self.addresses.iter().map(|(role, address)| (*role, *address))
    }

    /// Status addresses that answer read requests, in role order.
    pub fn readable_addresses(&self) -> impl Iterator<Item = (Role, GroupAddress)> + '_ {
        self.addresses().filter(|(role, _)| role.is_readable())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<String>,
    name: Option<String>,
    class: Option<DeviceClass>,
    addresses: BTreeMap<Role, GroupAddress>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: DeviceClass) -> Self {
        self.class = Some(class);
        self
    }

    #[must_use]
    pub fn address(mut self, role: Role, address: GroupAddress) -> Self {
        self.addresses.insert(role, address);
        self
    }

    /// Consume the builder and return a validated [`Device`].
    ///
    /// The class defaults to [`DeviceClass::LightSwitch`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the id or name is empty.
    pub fn build(self) -> Result<Device, ValidationError> {
        let id = DeviceId::new(self.id.unwrap_or_default())?;
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Device {
            id,
            name,
            class: self.class.unwrap_or(DeviceClass::LightSwitch),
            addresses: self.addresses,
        })
    }
}

/// Flat catalog representation of a [`Device`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    class: DeviceClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_power_state_write: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_power_state_status: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_percentage_write: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_percentage_status: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_current_temperature: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_target_temperature_write: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_target_temperature_status: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_wind_speed: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_light_intensity: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_rainfall: Option<GroupAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ga_lock_object: Option<GroupAddress>,
}

impl DeviceRecord {
    fn slots(&self) -> [(Role, Option<GroupAddress>); 11] {
        [
            (Role::PowerWrite, self.ga_power_state_write),
            (Role::PowerStatus, self.ga_power_state_status),
            (Role::PercentageWrite, self.ga_percentage_write),
            (Role::PercentageStatus, self.ga_percentage_status),
            (Role::CurrentTemperature, self.ga_current_temperature),
            (Role::TargetTemperatureWrite, self.ga_target_temperature_write),
            (Role::TargetTemperatureStatus, self.ga_target_temperature_status),
            (Role::WindSpeed, self.ga_wind_speed),
            (Role::LightIntensity, self.ga_light_intensity),
            (Role::Rainfall, self.ga_rainfall),
            (Role::Lock, self.ga_lock_object),
        ]
    }
}

impl TryFrom<DeviceRecord> for Device {
    type Error = ValidationError;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        let addresses = record
            .slots()
            .into_iter()
            .filter_map(|(role, address)| address.map(|address| (role, address)))
            .collect();
        let device = Device::builder()
            .id(record.id)
            .name(record.name)
            .class(record.class)
            .build()?;
        Ok(Device { addresses, ..device })
    }
}

impl From<Device> for DeviceRecord {
    fn from(device: Device) -> Self {
        let get = |role| device.address(role);
        Self {
            ga_power_state_write: get(Role::PowerWrite),
            ga_power_state_status: get(Role::PowerStatus),
            ga_percentage_write: get(Role::PercentageWrite),
            ga_percentage_status: get(Role::PercentageStatus),
            ga_current_temperature: get(Role::CurrentTemperature),
            ga_target_temperature_write: get(Role::TargetTemperatureWrite),
            ga_target_temperature_status: get(Role::TargetTemperatureStatus),
            ga_wind_speed: get(Role::WindSpeed),
            ga_light_intensity: get(Role::LightIntensity),
            ga_rainfall: get(Role::Rainfall),
            ga_lock_object: get(Role::Lock),
            id: device.id.0,
            name: device.name,
            class: device.class,
        }
    }
}
