//! Bus transport port: connect, send writes and reads, receive telegrams.
//!
//! Inbound application-layer telegrams are delivered through the
//! [`BusSession::inbound`] channel, one message per telegram, for as long as
//! the connection lives. The channel closing means the link is gone.

use std::future::Future;

use tokio::sync::mpsc;

use knxhub_domain::address::GroupAddress;
use knxhub_domain::error::HubError;
use knxhub_domain::telegram::Telegram;

/// A freshly established connection and its inbound telegram stream.
pub struct BusSession<C> {
    pub connection: C,
    pub inbound: mpsc::Receiver<Telegram>,
}

/// Opens connections to the bus gateway.
pub trait BusConnector: Send + Sync {
    /// Connection type produced by [`connect`](Self::connect).
    type Connection: BusConnection + 'static;

    /// Establish a new connection.
    fn connect(
        &self,
    ) -> impl Future<Output = Result<BusSession<Self::Connection>, HubError>> + Send;
}

/// An established bus connection.
pub trait BusConnection: Send + Sync {
    /// Whether the link is still up. Polled by the supervisor.
    fn is_alive(&self) -> bool;

    /// Send a group write carrying an encoded payload.
    fn send_write(
        &self,
        address: GroupAddress,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Send a group read request.
    ///
    /// Completes once the gateway has taken the request; the response arrives
    /// later as an inbound telegram. Callers bound this with a timeout.
    fn send_read(&self, address: GroupAddress) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Tear the connection down.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
