//! Webhooks: outbound URLs called when a device is switched on.

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;

/// A URL to call with a plain GET for a given device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub device_id: DeviceId,
    pub url: String,
}
