//! Bridge service: the caller-facing operations of the hub.
//!
//! Commands send one group write and, once the bus accepted it, record the
//! new value in the state store.

use std::sync::Arc;

use knxhub_domain::address::GroupAddress;
use knxhub_domain::catalog::DeviceCatalog;
use knxhub_domain::datapoint::DatapointValue;
use knxhub_domain::device::Device;
use knxhub_domain::error::{HubError, NotFoundError, ValidationError};
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::role::Role;
use knxhub_domain::state::{DeviceState, PowerState, StateChange};

use crate::bus_handle::BusHandle;
use crate::ports::{BusConnection, StateChangeSink};
use crate::resync::ResyncDriver;
use crate::state_store::StateStore;

pub struct BridgeService<P, C> {
    catalog: Arc<DeviceCatalog>,
    store: Arc<StateStore<P>>,
    bus: BusHandle<C>,
    resync: ResyncDriver<C>,
}

impl<P, C> BridgeService<P, C>
where
    P: StateChangeSink,
    C: BusConnection + 'static,
{
    /// Create a new service over the shared catalog, store and bus handle.
    pub fn new(
        catalog: Arc<DeviceCatalog>,
        store: Arc<StateStore<P>>,
        bus: BusHandle<C>,
        resync: ResyncDriver<C>,
    ) -> Self {
        Self {
            catalog,
            store,
            bus,
            resync,
        }
    }

    /// Every device of the catalog, in file order.
    #[must_use]
    pub fn list_devices(&self) -> &[Device] {
        self.catalog.devices()
    }

    /// Snapshot of every device that has reported at least one value.
    #[must_use]
    pub fn current_states(&self) -> Vec<DeviceState> {
        self.store.current_states()
    }

    /// Every recorded change since process start.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.history()
    }

    /// Switch a device on or off.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown device,
    /// [`HubError::Validation`] when it has no power-write address, or
    /// [`HubError::BusUnavailable`] / [`HubError::Transport`] when the write
    /// cannot be sent.
    #[tracing::instrument(skip(self))]
    pub async fn set_power_state(&self, device_id: &str, state: PowerState) -> Result<HistoryEntry, HubError> {
        self.command(
            device_id,
            Role::PowerWrite,
            DatapointValue::Switch(state.is_on()),
            StateChange::PowerState(state),
        )
        .await
    }

    /// Set a dimmer or shutter position.
    ///
    /// # Errors
    ///
    /// Same as [`set_power_state`](Self::set_power_state), plus
    /// [`ValidationError::PercentageOutOfRange`] above 100.
    #[tracing::instrument(skip(self))]
    pub async fn set_percentage(&self, device_id: &str, percent: u8) -> Result<HistoryEntry, HubError> {
        if percent > 100 {
            return Err(ValidationError::PercentageOutOfRange(percent).into());
        }
        self.command(
            device_id,
            Role::PercentageWrite,
            DatapointValue::Scaling(percent),
            StateChange::Percentage(percent),
        )
        .await
    }

    /// Set a heating setpoint.
    ///
    /// # Errors
    ///
    /// Same as [`set_power_state`](Self::set_power_state), plus a validation
    /// error when the value is not finite or outside the DPT 9 range.
    #[tracing::instrument(skip(self))]
    pub async fn set_target_temperature(&self, device_id: &str, celsius: f64) -> Result<HistoryEntry, HubError> {
        self.command(
            device_id,
            Role::TargetTemperatureWrite,
            DatapointValue::Float16(celsius),
            StateChange::TargetTemperature(celsius),
        )
        .await
    }

    /// Kick off a full resync in the background.
    ///
    /// Returns `false` when a run is already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::BusUnavailable`] without a live connection.
    pub fn resync(&self) -> Result<bool, HubError> {
        if !self.bus.is_connected() {
            return Err(HubError::BusUnavailable);
        }
        Ok(self.resync.start().is_some())
    }

    async fn command(
        &self,
        device_id: &str,
        role: Role,
        value: DatapointValue,
        change: StateChange,
    ) -> Result<HistoryEntry, HubError> {
        let device = self.catalog.find(device_id).ok_or_else(|| NotFoundError {
            entity: "Device",
            id: device_id.to_string(),
        })?;
        let address = target(device, role)?;
        let payload = value.encode().map_err(ValidationError::from)?;

        self.bus.write(address, payload).await?;
        Ok(self.store.record(&device.id, change).await)
    }
}

fn target(device: &Device, role: Role) -> Result<GroupAddress, ValidationError> {
    device.address(role).ok_or_else(|| ValidationError::MissingAddress {
        device_id: device.id.to_string(),
        role,
    })
}
