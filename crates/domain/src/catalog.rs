//! Device catalog: the fixed set of devices known for the lifetime of the
//! process.

use std::collections::HashSet;

use crate::device::{Device, DeviceId};
use crate::error::ValidationError;

/// Read-only list of devices with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
}

impl DeviceCatalog {
    /// Build a catalog, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateDeviceId`] when two devices share
    /// an identifier.
    pub fn new(devices: Vec<Device>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(devices.len());
        for device in &devices {
            if !seen.insert(&device.id) {
                return Err(ValidationError::DuplicateDeviceId(device.id.to_string()));
            }
        }
        Ok(Self { devices })
    }

    /// A catalog with no devices.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|device| &device.id == id)
    }

    /// Look up a device by its raw identifier.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.id.as_str() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
