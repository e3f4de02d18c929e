//! History entries: append-only records of single-field state changes.

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::state::StateChange;

/// One observed change: the device, when it happened, and the one field that
/// changed.
///
/// Serializes as `{"deviceId": …, "timestampInMillis": …, "<field>": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub device_id: DeviceId,
    #[serde(rename = "timestampInMillis")]
    pub timestamp_millis: i64,
    #[serde(flatten)]
    pub change: StateChange,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(device_id: DeviceId, timestamp_millis: i64, change: StateChange) -> Self {
        Self {
            device_id,
            timestamp_millis,
            change,
        }
    }
}
