//! Notification trigger: calls the webhooks of a device when it turns on.
//!
//! Every ON observation fires, whether or not the device was already on.
//! Deliveries run concurrently and independently: one failing URL is logged
//! and never holds back the others. There is no retry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use knxhub_domain::device::DeviceId;
use knxhub_domain::state::PowerState;
use knxhub_domain::webhook::Webhook;

use crate::ports::WebhookCaller;

/// Outcome of one notification round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub attempted: usize,
    pub failed: usize,
}

/// Webhook fan-out keyed by device.
pub struct NotificationTrigger<W> {
    caller: Arc<W>,
    targets: HashMap<DeviceId, Vec<String>>,
}

impl<W: WebhookCaller + 'static> NotificationTrigger<W> {
    /// Group `webhooks` by device, keeping catalog order per device.
    pub fn new(caller: W, webhooks: Vec<Webhook>) -> Self {
        let mut targets: HashMap<DeviceId, Vec<String>> = HashMap::new();
        for hook in webhooks {
            targets.entry(hook.device_id).or_default().push(hook.url);
        }
        Self {
            caller: Arc::new(caller),
            targets,
        }
    }

    /// URLs registered for `device_id`.
    #[must_use]
    pub fn targets(&self, device_id: &DeviceId) -> &[String] {
        self.targets.get(device_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// React to a decoded power state. Only [`PowerState::On`] fires.
    pub async fn on_power_state_change(&self, device_id: &DeviceId, state: PowerState) -> Delivery {
        if !state.is_on() {
            return Delivery::default();
        }

        let mut deliveries = JoinSet::new();
        for url in self.targets(device_id) {
            let caller = Arc::clone(&self.caller);
            let url = url.clone();
            deliveries.spawn(async move {
                let result = caller.call(&url).await;
                (url, result)
            });
        }

        let mut delivery = Delivery::default();
        while let Some(joined) = deliveries.join_next().await {
            delivery.attempted += 1;
            match joined {
                Ok((url, Ok(()))) => {
                    tracing::info!(%device_id, %url, "webhook delivered");
                }
                Ok((url, Err(err))) => {
                    delivery.failed += 1;
                    tracing::warn!(%err, %device_id, %url, "webhook call failed");
                }
                Err(err) => {
                    delivery.failed += 1;
                    tracing::error!(%err, %device_id, "webhook task aborted");
                }
            }
        }
        delivery
    }
}
