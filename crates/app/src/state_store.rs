//! State store: the current-state cache and the history ledger.
//!
//! Every mutation goes through [`StateStore::record`]: the cache update and
//! the history append happen under one write lock, so readers never see one
//! without the other. Durable persistence runs afterwards, still inside the
//! store's persist gate, so rows reach the backend in history order. It is
//! best effort: a failing backend is logged and never rolls the in-memory
//! ledger back.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;

use knxhub_domain::device::DeviceId;
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::{DeviceState, PowerState, StateChange};
use knxhub_domain::time::now_millis;

use crate::ports::StateChangeSink;

#[derive(Debug, Default)]
struct Ledger {
    states: BTreeMap<DeviceId, DeviceState>,
    history: Vec<HistoryEntry>,
    last_millis: i64,
}

/// Owner of all [`DeviceState`]s and [`HistoryEntry`]s.
pub struct StateStore<P> {
    ledger: RwLock<Ledger>,
    // Held from the ledger update until the sink returns.
    persist: Mutex<()>,
    sink: P,
    clock: fn() -> i64,
}

impl<P: StateChangeSink> StateStore<P> {
    /// Create an empty store persisting through `sink`.
    pub fn new(sink: P) -> Self {
        Self::with_clock(sink, now_millis)
    }

    /// Create an empty store reading time from `clock` (milliseconds).
    pub fn with_clock(sink: P, clock: fn() -> i64) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            persist: Mutex::new(()),
            sink,
            clock,
        }
    }

    /// Apply `change` to the device's state, append it to the history and
    /// hand it to the persistence backend.
    ///
    /// History timestamps never go backwards, even if the wall clock does.
    pub async fn record(&self, device_id: &DeviceId, change: StateChange) -> HistoryEntry {
        let _gate = self.persist.lock().await;
        let entry = {
            let mut ledger = self.write();
            let timestamp = (self.clock)().max(ledger.last_millis);
            ledger.last_millis = timestamp;
            ledger
                .states
                .entry(device_id.clone())
                .or_insert_with(|| DeviceState::new(device_id.clone()))
                .apply(change);
            let entry = HistoryEntry::new(device_id.clone(), timestamp, change);
            ledger.history.push(entry.clone());
            entry
        };

        if let Err(err) = self.sink.append(&entry).await {
            tracing::warn!(
                %err,
                device_id = %entry.device_id,
                field = entry.change.field_name(),
                "failed to persist state change"
            );
        }
        entry
    }

    pub async fn update_power_state(&self, device_id: &DeviceId, state: PowerState) -> HistoryEntry {
        self.record(device_id, StateChange::PowerState(state)).await
    }

    pub async fn update_percentage(&self, device_id: &DeviceId, percent: u8) -> HistoryEntry {
        self.record(device_id, StateChange::Percentage(percent)).await
    }

    pub async fn update_current_temperature(&self, device_id: &DeviceId, value: f64) -> HistoryEntry {
        self.record(device_id, StateChange::CurrentTemperature(value)).await
    }

    pub async fn update_target_temperature(&self, device_id: &DeviceId, value: f64) -> HistoryEntry {
        self.record(device_id, StateChange::TargetTemperature(value)).await
    }

    pub async fn update_wind_speed(&self, device_id: &DeviceId, value: f64) -> HistoryEntry {
        self.record(device_id, StateChange::WindSpeed(value)).await
    }

    pub async fn update_light_intensity(&self, device_id: &DeviceId, value: f64) -> HistoryEntry {
        self.record(device_id, StateChange::LightIntensity(value)).await
    }

    pub async fn update_rainfall(&self, device_id: &DeviceId, raining: bool) -> HistoryEntry {
        self.record(device_id, StateChange::Rainfall(raining)).await
    }

    pub async fn update_locked(&self, device_id: &DeviceId, locked: bool) -> HistoryEntry {
        self.record(device_id, StateChange::Locked(locked)).await
    }
}

impl<P> StateStore<P> {
    /// Snapshot of every known device state, ordered by device id.
    #[must_use]
    pub fn current_states(&self) -> Vec<DeviceState> {
        self.read().states.values().cloned().collect()
    }

    /// Snapshot of one device's state.
    #[must_use]
    pub fn state(&self, device_id: &DeviceId) -> Option<DeviceState> {
        self.read().states.get(device_id).cloned()
    }

    /// Every history entry since process start, in observation order.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.read().history.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().unwrap_or_else(PoisonError::into_inner)
    }
}
