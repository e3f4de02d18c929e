//! # knxhub-adapter-virtual-bus
//!
//! Simulated bus gateway for demos and end-to-end tests.
//!
//! ## Behaviour
//!
//! | Request | Effect |
//! |---------|--------|
//! | write on a write-role address | the value is stored and echoed as a write on the linked status address, like an actuator reporting back |
//! | write on any other address | the value is stored |
//! | read | answered with a response carrying the last stored value, silently ignored if none |
//!
//! [`VirtualBus::drop_link`] kills the current connection and
//! [`VirtualBus::set_reachable`] makes new connection attempts fail, so the
//! supervisor's recovery can be exercised without hardware.
//!
//! ## Dependency rule
//!
//! Depends on `knxhub-app` (port traits) and `knxhub-domain` only.

mod connection;
mod error;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use knxhub_app::ports::{BusConnector, BusSession};
use knxhub_domain::address::GroupAddress;
use knxhub_domain::catalog::DeviceCatalog;
use knxhub_domain::error::HubError;
use knxhub_domain::role::Role;
use knxhub_domain::telegram::Telegram;

pub use connection::VirtualConnection;
pub use error::VirtualBusError;

const INBOUND_CAPACITY: usize = 256;

/// Write role and the status role an actuator reports it back on.
const FEEDBACK: [(Role, Role); 3] = [
    (Role::PowerWrite, Role::PowerStatus),
    (Role::PercentageWrite, Role::PercentageStatus),
    (Role::TargetTemperatureWrite, Role::TargetTemperatureStatus),
];

struct Link {
    alive: Arc<AtomicBool>,
    sender: mpsc::Sender<Telegram>,
}

pub(crate) struct Shared {
    feedback: HashMap<GroupAddress, GroupAddress>,
    values: Mutex<HashMap<GroupAddress, Vec<u8>>>,
    link: Mutex<Option<Link>>,
    reachable: AtomicBool,
    connects: AtomicUsize,
}

impl Shared {
    pub(crate) fn store(&self, address: GroupAddress, payload: Vec<u8>) {
        lock(&self.values).insert(address, payload);
    }

    pub(crate) fn value(&self, address: GroupAddress) -> Option<Vec<u8>> {
        lock(&self.values).get(&address).cloned()
    }

    pub(crate) fn feedback_for(&self, address: GroupAddress) -> Option<GroupAddress> {
        self.feedback.get(&address).copied()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle onto the simulated gateway. Clones share the same bus.
#[derive(Clone)]
pub struct VirtualBus {
    shared: Arc<Shared>,
}

impl VirtualBus {
    /// Build a bus whose actuators mirror the devices of `catalog`.
    #[must_use]
    pub fn from_catalog(catalog: &DeviceCatalog) -> Self {
        let feedback = catalog
            .devices()
            .iter()
            .flat_map(|device| {
                FEEDBACK.iter().filter_map(|(write, status)| {
                    Some((device.address(*write)?, device.address(*status)?))
                })
            })
            .collect();
        Self {
            shared: Arc::new(Shared {
                feedback,
                values: Mutex::new(HashMap::new()),
                link: Mutex::new(None),
                reachable: AtomicBool::new(true),
                connects: AtomicUsize::new(0),
            }),
        }
    }

    /// Preload the value an address reports when read.
    pub fn seed(&self, address: GroupAddress, payload: Vec<u8>) {
        self.shared.store(address, payload);
    }

    /// Last value seen on `address`.
    #[must_use]
    pub fn value(&self, address: GroupAddress) -> Option<Vec<u8>> {
        self.shared.value(address)
    }

    /// Emit a telegram as if a field device had sent it.
    ///
    /// Returns `false` when no connection is up to receive it.
    pub async fn inject(&self, telegram: Telegram) -> bool {
        if telegram.carries_value() {
            self.shared.store(telegram.destination, telegram.payload.clone());
        }
        let sender = lock(&self.shared.link)
            .as_ref()
            .filter(|link| link.alive.load(Ordering::SeqCst))
            .map(|link| link.sender.clone());
        match sender {
            Some(sender) => sender.send(telegram).await.is_ok(),
            None => false,
        }
    }

    /// Kill the current connection, as if the gateway went away.
    pub fn drop_link(&self) {
        if let Some(link) = lock(&self.shared.link).take() {
            link.alive.store(false, Ordering::SeqCst);
            tracing::info!("virtual bus link dropped");
        }
    }

    /// Make subsequent connection attempts succeed or fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of successful connections so far.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }
}

impl BusConnector for VirtualBus {
    type Connection = VirtualConnection;

    async fn connect(&self) -> Result<BusSession<VirtualConnection>, HubError> {
        if !self.shared.reachable.load(Ordering::SeqCst) {
            return Err(VirtualBusError::Unreachable.into());
        }
        let (sender, inbound) = mpsc::channel(INBOUND_CAPACITY);
        let alive = Arc::new(AtomicBool::new(true));

        let previous = lock(&self.shared.link).replace(Link {
            alive: Arc::clone(&alive),
            sender: sender.clone(),
        });
        if let Some(previous) = previous {
            previous.alive.store(false, Ordering::SeqCst);
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(links = self.shared.feedback.len(), "virtual bus connected");

        Ok(BusSession {
            connection: VirtualConnection::new(Arc::clone(&self.shared), alive, sender),
            inbound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knxhub_app::ports::BusConnection;
    use knxhub_domain::device::Device;
    use knxhub_domain::telegram::TelegramKind;
    use std::time::Duration;

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    fn bus() -> VirtualBus {
        let catalog = DeviceCatalog::new(vec![
            Device::builder()
                .id("lamp")
                .name("Lamp")
                .address(Role::PowerWrite, ga("0/0/1"))
                .address(Role::PowerStatus, ga("0/0/2"))
                .build()
                .unwrap(),
        ])
        .unwrap();
        VirtualBus::from_catalog(&catalog)
    }

    async fn next(inbound: &mut mpsc::Receiver<Telegram>) -> Telegram {
        tokio::time::timeout(Duration::from_secs(1), inbound.recv())
            .await
            .expect("no telegram received")
            .expect("inbound closed")
    }

    #[tokio::test]
    async fn should_echo_write_on_linked_status_address() {
        let bus = bus();
        let mut session = bus.connect().await.unwrap();

        session
            .connection
            .send_write(ga("0/0/1"), vec![1])
            .await
            .unwrap();

        let telegram = next(&mut session.inbound).await;
        assert_eq!(telegram, Telegram::write(ga("0/0/2"), vec![1]));
        assert_eq!(bus.value(ga("0/0/2")), Some(vec![1]));
    }

    #[tokio::test]
    async fn should_answer_read_with_last_value() {
        let bus = bus();
        bus.seed(ga("0/0/2"), vec![0]);
        let mut session = bus.connect().await.unwrap();

        session.connection.send_read(ga("0/0/2")).await.unwrap();

        let telegram = next(&mut session.inbound).await;
        assert_eq!(telegram.kind, TelegramKind::Response);
        assert_eq!(telegram.payload, vec![0]);
    }

    #[tokio::test]
    async fn should_ignore_read_of_unknown_address() {
        let bus = bus();
        let mut session = bus.connect().await.unwrap();

        session.connection.send_read(ga("5/5/5")).await.unwrap();

        assert!(session.inbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_fail_requests_after_link_dropped() {
        let bus = bus();
        let session = bus.connect().await.unwrap();

        bus.drop_link();

        assert!(!session.connection.is_alive());
        let result = session.connection.send_write(ga("0/0/1"), vec![1]).await;
        assert!(matches!(result, Err(HubError::Transport(_))));
    }

    #[tokio::test]
    async fn should_refuse_connection_when_unreachable() {
        let bus = bus();
        bus.set_reachable(false);

        let result = bus.connect().await;

        assert!(matches!(result, Err(HubError::Transport(_))));
        assert_eq!(bus.connect_count(), 0);
    }

    #[tokio::test]
    async fn should_deliver_injected_telegrams() {
        let bus = bus();
        assert!(!bus.inject(Telegram::write(ga("0/0/2"), vec![1])).await);

        let mut session = bus.connect().await.unwrap();
        assert!(bus.inject(Telegram::write(ga("0/0/2"), vec![0])).await);

        assert_eq!(next(&mut session.inbound).await.payload, vec![0]);
    }

    #[tokio::test]
    async fn should_retire_previous_connection_on_reconnect() {
        let bus = bus();
        let first = bus.connect().await.unwrap();
        let second = bus.connect().await.unwrap();

        assert!(!first.connection.is_alive());
        assert!(second.connection.is_alive());
        assert_eq!(bus.connect_count(), 2);
    }
}
