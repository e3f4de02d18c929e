//! Connection supervisor: keeps a bus connection up for the life of the
//! process and feeds its inbound telegrams to the dispatcher.
//!
//! ```text
//! Disconnected ──▶ Connecting ──▶ Connected
//!      ▲               │              │
//!      └───────────────┴──────────────┘  (failure, liveness loss, link closed)
//! ```
//!
//! Retries are unbounded with a fixed delay between attempts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use knxhub_domain::connection::{ConnectionState, InvalidTransition};
use knxhub_domain::telegram::Telegram;

use crate::bus_handle::BusHandle;
use crate::dispatcher::Dispatcher;
use crate::ports::{BusConnection, BusConnector, StateChangeSink, WebhookCaller};

/// Timing of the supervision loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    /// How often a live connection is checked.
    pub liveness_interval: Duration,
    /// Pause between a failure and the next connection attempt.
    pub retry_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            liveness_interval: Duration::from_secs(1),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Why a served connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkLoss {
    NotAlive,
    InboundClosed,
}

/// Owner of the bus connection lifecycle.
pub struct ConnectionSupervisor<K: BusConnector, P, W> {
    connector: K,
    bus: BusHandle<K::Connection>,
    dispatcher: Dispatcher<P, W>,
    config: SupervisorConfig,
    state: watch::Sender<ConnectionState>,
}

impl<K, P, W> ConnectionSupervisor<K, P, W>
where
    K: BusConnector + 'static,
    P: StateChangeSink + 'static,
    W: WebhookCaller + 'static,
{
    pub fn new(
        connector: K,
        bus: BusHandle<K::Connection>,
        dispatcher: Dispatcher<P, W>,
        config: SupervisorConfig,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            bus,
            dispatcher,
            config,
            state,
        }
    }

    /// Observe lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Spawn the supervision loop. It only ends when the task is aborted.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            self.advance(ConnectionState::to_connecting);
            match self.connector.connect().await {
                Ok(session) => {
                    attempt = 0;
                    let connection = Arc::new(session.connection);
                    let mut inbound = session.inbound;
                    self.bus.install(Arc::clone(&connection));
                    self.advance(ConnectionState::to_connected);

                    let loss = self.serve(connection.as_ref(), &mut inbound).await;

                    self.bus.clear();
                    connection.close().await;
                    self.state.send_modify(|state| *state = state.to_disconnected());
                    tracing::warn!(reason = ?loss, "bus connection lost, reconnecting");
                }
                Err(err) => {
                    self.state.send_modify(|state| *state = state.to_disconnected());
                    tracing::warn!(%err, attempt, "bus connection attempt failed");
                }
            }
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Dispatch inbound telegrams until the link goes away.
    async fn serve(
        &self,
        connection: &K::Connection,
        inbound: &mut mpsc::Receiver<Telegram>,
    ) -> LinkLoss {
        let mut liveness = tokio::time::interval(self.config.liveness_interval);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = liveness.tick() => {
                    if !connection.is_alive() {
                        return LinkLoss::NotAlive;
                    }
                }
                telegram = inbound.recv() => match telegram {
                    Some(telegram) => {
                        self.dispatcher.dispatch(telegram).await;
                    }
                    None => return LinkLoss::InboundClosed,
                },
            }
        }
    }

    fn advance(&self, step: fn(ConnectionState) -> Result<ConnectionState, InvalidTransition>) {
        self.state.send_modify(|state| match step(*state) {
            Ok(next) => {
                tracing::info!(from = %state, to = %next, "bus connection state changed");
                *state = next;
            }
            Err(err) => tracing::error!(%err, "invalid bus connection transition"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationTrigger;
    use crate::ports::BusSession;
    use crate::resolver::RoleResolver;
    use crate::state_store::StateStore;
    use knxhub_domain::address::GroupAddress;
    use knxhub_domain::catalog::DeviceCatalog;
    use knxhub_domain::device::{Device, DeviceId};
    use knxhub_domain::error::HubError;
    use knxhub_domain::history::HistoryEntry;
    use knxhub_domain::role::Role;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct NullSink;

    impl StateChangeSink for NullSink {
        async fn append(&self, _entry: &HistoryEntry) -> Result<(), HubError> {
            Ok(())
        }
    }

    struct NullCaller;

    impl WebhookCaller for NullCaller {
        async fn call(&self, _url: &str) -> Result<(), HubError> {
            Ok(())
        }
    }

    struct FlakyConnection {
        alive: Arc<AtomicBool>,
    }

    impl BusConnection for FlakyConnection {
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn send_write(&self, _address: GroupAddress, _payload: Vec<u8>) -> Result<(), HubError> {
            Ok(())
        }

        async fn send_read(&self, _address: GroupAddress) -> Result<(), HubError> {
            Ok(())
        }

        async fn close(&self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    /// Fails the first `failures` attempts, then hands out connections whose
    /// liveness flag and inbound sender are exposed to the test.
    struct ScriptedConnector {
        failures: usize,
        attempts: AtomicUsize,
        links: Mutex<Vec<(Arc<AtomicBool>, mpsc::Sender<Telegram>)>>,
    }

    impl ScriptedConnector {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
                links: Mutex::new(Vec::new()),
            }
        }
    }

    impl BusConnector for Arc<ScriptedConnector> {
        type Connection = FlakyConnection;

        async fn connect(&self) -> Result<BusSession<FlakyConnection>, HubError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(HubError::Transport("gateway unreachable".into()));
            }
            let alive = Arc::new(AtomicBool::new(true));
            let (tx, rx) = mpsc::channel(16);
            self.links.lock().unwrap().push((Arc::clone(&alive), tx));
            Ok(BusSession {
                connection: FlakyConnection { alive },
                inbound: rx,
            })
        }
    }

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    type Supervisor = ConnectionSupervisor<Arc<ScriptedConnector>, NullSink, NullCaller>;

    fn supervisor(
        connector: Arc<ScriptedConnector>,
    ) -> (Supervisor, BusHandle<FlakyConnection>, Arc<StateStore<NullSink>>) {
        let catalog = DeviceCatalog::new(vec![
            Device::builder()
                .id("lamp")
                .name("Lamp")
                .address(Role::PowerStatus, ga("0/0/2"))
                .build()
                .unwrap(),
        ])
        .unwrap();
        let store = Arc::new(StateStore::new(NullSink));
        let dispatcher = Dispatcher::new(
            Arc::new(RoleResolver::new(&catalog)),
            Arc::clone(&store),
            Arc::new(NotificationTrigger::new(NullCaller, Vec::new())),
        );
        let bus = BusHandle::new();
        let supervisor = ConnectionSupervisor::new(
            connector,
            bus.clone(),
            dispatcher,
            SupervisorConfig {
                liveness_interval: Duration::from_millis(100),
                retry_delay: Duration::from_millis(500),
            },
        );
        (supervisor, bus, store)
    }

    async fn wait_for(rx: &mut watch::Receiver<ConnectionState>, wanted: ConnectionState) {
        tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|state| *state == wanted))
            .await
            .expect("state not reached in time")
            .expect("supervisor stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn should_retry_until_connected() {
        let connector = Arc::new(ScriptedConnector::new(3));
        let (supervisor, bus, _store) = supervisor(Arc::clone(&connector));
        let mut state = supervisor.subscribe();
        let task = supervisor.start();

        wait_for(&mut state, ConnectionState::Connected).await;

        assert_eq!(connector.attempts.load(Ordering::SeqCst), 4);
        assert!(bus.is_connected());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_dispatch_inbound_telegrams_while_connected() {
        let connector = Arc::new(ScriptedConnector::new(0));
        let (supervisor, _bus, store) = supervisor(Arc::clone(&connector));
        let mut state = supervisor.subscribe();
        let task = supervisor.start();
        wait_for(&mut state, ConnectionState::Connected).await;

        let sender = connector.links.lock().unwrap()[0].1.clone();
        sender.send(Telegram::write(ga("0/0/2"), vec![1])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let lamp = DeviceId::new("lamp").unwrap();
        assert!(store.state(&lamp).unwrap().power_state.unwrap().is_on());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_reconnect_after_liveness_loss_and_resume_dispatch() {
        let connector = Arc::new(ScriptedConnector::new(0));
        let (supervisor, bus, store) = supervisor(Arc::clone(&connector));
        let mut state = supervisor.subscribe();
        let task = supervisor.start();
        wait_for(&mut state, ConnectionState::Connected).await;

        let (alive, _) = connector.links.lock().unwrap()[0].clone();
        alive.store(false, Ordering::SeqCst);
        wait_for(&mut state, ConnectionState::Disconnected).await;
        assert!(!bus.is_connected());

        wait_for(&mut state, ConnectionState::Connected).await;
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 2);

        let sender = connector.links.lock().unwrap()[1].1.clone();
        sender.send(Telegram::write(ga("0/0/2"), vec![0])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let lamp = DeviceId::new("lamp").unwrap();
        assert!(!store.state(&lamp).unwrap().power_state.unwrap().is_on());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_reconnect_when_inbound_stream_closes() {
        let connector = Arc::new(ScriptedConnector::new(0));
        let (supervisor, _bus, _store) = supervisor(Arc::clone(&connector));
        let mut state = supervisor.subscribe();
        let task = supervisor.start();
        wait_for(&mut state, ConnectionState::Connected).await;

        connector.links.lock().unwrap().clear();
        wait_for(&mut state, ConnectionState::Disconnected).await;
        wait_for(&mut state, ConnectionState::Connected).await;

        assert_eq!(connector.attempts.load(Ordering::SeqCst), 2);
        task.abort();
    }
}
