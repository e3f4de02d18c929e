//! Inbound dispatch: resolver, decoder, state store, notification trigger.
//!
//! Nothing in here fails past the dispatch boundary: unknown addresses and
//! read requests are dropped silently, malformed payloads are logged and
//! dropped, and webhook delivery runs on its own task.

use std::sync::Arc;

use knxhub_domain::decoder::{self, DecodeError};
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::StateChange;
use knxhub_domain::telegram::Telegram;

use crate::notification::NotificationTrigger;
use crate::ports::{StateChangeSink, WebhookCaller};
use crate::resolver::RoleResolver;
use crate::state_store::StateStore;

/// What became of one inbound telegram.
#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    /// Read request or empty payload.
    NoValue,
    /// No device declares the destination address.
    Unrouted,
    /// The address belongs to a write role, which carries no state.
    WriteRole,
    /// The payload did not match the role's datapoint.
    Malformed(DecodeError),
    /// The state store recorded a change.
    Applied(HistoryEntry),
}

/// Routes decoded telegrams into the state store.
pub struct Dispatcher<P, W> {
    resolver: Arc<RoleResolver>,
    store: Arc<StateStore<P>>,
    trigger: Arc<NotificationTrigger<W>>,
}

impl<P, W> Clone for Dispatcher<P, W> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            store: Arc::clone(&self.store),
            trigger: Arc::clone(&self.trigger),
        }
    }
}

impl<P, W> Dispatcher<P, W>
where
    P: StateChangeSink + 'static,
    W: WebhookCaller + 'static,
{
    pub fn new(
        resolver: Arc<RoleResolver>,
        store: Arc<StateStore<P>>,
        trigger: Arc<NotificationTrigger<W>>,
    ) -> Self {
        Self {
            resolver,
            store,
            trigger,
        }
    }

    /// Process one inbound telegram to completion.
    ///
    /// Webhooks fired by an ON power state are delivered in the background.
    pub async fn dispatch(&self, telegram: Telegram) -> DispatchOutcome {
        if !telegram.carries_value() {
            tracing::trace!(address = %telegram.destination, kind = ?telegram.kind, "ignoring telegram without value");
            return DispatchOutcome::NoValue;
        }

        let Some(route) = self.resolver.resolve(telegram.destination) else {
            tracing::trace!(address = %telegram.destination, "no device for address");
            return DispatchOutcome::Unrouted;
        };

        let value = match decoder::decode(route.role, telegram.destination, &telegram.payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    %err,
                    device_id = %route.device_id,
                    role = %err.role,
                    address = %err.address,
                    raw = %err.raw_hex,
                    "dropping malformed telegram"
                );
                return DispatchOutcome::Malformed(err);
            }
        };

        let Some(change) = StateChange::for_role(route.role, value) else {
            tracing::trace!(device_id = %route.device_id, role = %route.role, "write-role telegram carries no state");
            return DispatchOutcome::WriteRole;
        };

        let entry = self.store.record(&route.device_id, change).await;
        tracing::debug!(
            device_id = %entry.device_id,
            field = change.field_name(),
            value = %change.value_text(),
            "state updated"
        );

        if let StateChange::PowerState(state) = change
            && state.is_on()
        {
            let trigger = Arc::clone(&self.trigger);
            let device_id = route.device_id.clone();
            tokio::spawn(async move {
                trigger.on_power_state_change(&device_id, state).await;
            });
        }

        DispatchOutcome::Applied(entry)
    }
}
