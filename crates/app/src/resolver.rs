//! Role resolver: reverse index from group address to `(device, role)`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use knxhub_domain::address::GroupAddress;
use knxhub_domain::catalog::DeviceCatalog;
use knxhub_domain::device::DeviceId;
use knxhub_domain::role::Role;

/// Where an inbound telegram belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub device_id: DeviceId,
    pub role: Role,
}

/// Immutable address index built once from the catalog.
///
/// When two declarations claim the same address the first one in catalog
/// order keeps it and the collision is logged.
#[derive(Debug, Default)]
pub struct RoleResolver {
    index: HashMap<GroupAddress, Route>,
    collisions: usize,
}

impl RoleResolver {
    /// Index every populated role address of every device.
    #[must_use]
    pub fn new(catalog: &DeviceCatalog) -> Self {
        let mut resolver = Self::default();
        for device in catalog.devices() {
            for (role, address) in device.addresses() {
                match resolver.index.entry(address) {
                    Entry::Vacant(slot) => {
                        slot.insert(Route {
                            device_id: device.id.clone(),
                            role,
                        });
                    }
                    Entry::Occupied(slot) => {
                        resolver.collisions += 1;
                        tracing::error!(
                            %address,
                            device_id = %device.id,
                            %role,
                            kept_device_id = %slot.get().device_id,
                            kept_role = %slot.get().role,
                            "group address declared twice, keeping first declaration"
                        );
                    }
                }
            }
        }
        resolver
    }

    /// Look up the owner of `address`.
    #[must_use]
    pub fn resolve(&self, address: GroupAddress) -> Option<&Route> {
        self.index.get(&address)
    }

    /// Number of indexed addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of declarations dropped because their address was taken.
    #[must_use]
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}
