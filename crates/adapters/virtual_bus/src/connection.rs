use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use knxhub_app::ports::BusConnection;
use knxhub_domain::address::GroupAddress;
use knxhub_domain::error::HubError;
use knxhub_domain::telegram::Telegram;

use crate::Shared;
use crate::error::VirtualBusError;

/// One connection to the [`VirtualBus`](crate::VirtualBus).
pub struct VirtualConnection {
    shared: Arc<Shared>,
    alive: Arc<AtomicBool>,
    sender: mpsc::Sender<Telegram>,
}

impl VirtualConnection {
    pub(crate) fn new(shared: Arc<Shared>, alive: Arc<AtomicBool>, sender: mpsc::Sender<Telegram>) -> Self {
        Self {
            shared,
            alive,
            sender,
        }
    }

    fn ensure_alive(&self) -> Result<(), VirtualBusError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(VirtualBusError::LinkDown)
        }
    }

    async fn deliver(&self, telegram: Telegram) -> Result<(), VirtualBusError> {
        self.sender
            .send(telegram)
            .await
            .map_err(|_| VirtualBusError::LinkDown)
    }
}

impl BusConnection for VirtualConnection {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn send_write(&self, address: GroupAddress, payload: Vec<u8>) -> Result<(), HubError> {
        self.ensure_alive()?;
        self.shared.store(address, payload.clone());
        if let Some(status) = self.shared.feedback_for(address) {
            self.shared.store(status, payload.clone());
            self.deliver(Telegram::write(status, payload)).await?;
        }
        Ok(())
    }

    async fn send_read(&self, address: GroupAddress) -> Result<(), HubError> {
        self.ensure_alive()?;
        match self.shared.value(address) {
            Some(payload) => self.deliver(Telegram::response(address, payload)).await?,
            None => tracing::trace!(%address, "virtual bus has no value to answer read"),
        }
        Ok(())
    }

    async fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
