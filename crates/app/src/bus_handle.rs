//! Shared access to the current bus connection.
//!
//! The [`ConnectionSupervisor`](crate::supervisor::ConnectionSupervisor) is the
//! only component that installs or clears the connection. Everyone else holds
//! a [`BusHandle`] and issues writes and reads through whatever connection is
//! live at the time, or gets [`HubError::BusUnavailable`].

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use knxhub_domain::address::GroupAddress;
use knxhub_domain::error::HubError;

use crate::ports::BusConnection;

/// Cloneable handle onto the supervised connection slot.
pub struct BusHandle<C> {
    slot: Arc<RwLock<Option<Arc<C>>>>,
}

impl<C> Clone for BusHandle<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C> Default for BusHandle<C> {
    fn default() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }
}

impl<C: BusConnection> BusHandle<C> {
    /// A handle with no connection installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live connection is installed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current().is_some_and(|connection| connection.is_alive())
    }

    /// Send a group write.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::BusUnavailable`] without a live connection, or the
    /// transport error reported by the connection.
    pub async fn write(&self, address: GroupAddress, payload: Vec<u8>) -> Result<(), HubError> {
        let connection = self.live()?;
        connection.send_write(address, payload).await
    }

    /// Send a group read request, waiting at most `timeout` for the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::BusUnavailable`] without a live connection,
    /// [`HubError::Timeout`] when the request does not complete in time, or
    /// the transport error reported by the connection.
    pub async fn read(&self, address: GroupAddress, timeout: Duration) -> Result<(), HubError> {
        let connection = self.live()?;
        tokio::time::timeout(timeout, connection.send_read(address))
            .await
            .map_err(|_| HubError::Timeout {
                address,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    pub(crate) fn install(&self, connection: Arc<C>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(connection);
    }

    pub(crate) fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<Arc<C>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn live(&self) -> Result<Arc<C>, HubError> {
        self.current()
            .filter(|connection| connection.is_alive())
            .ok_or(HubError::BusUnavailable)
    }
}
