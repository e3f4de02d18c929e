use knxhub_domain::error::HubError;

/// Failures of the simulated gateway.
#[derive(Debug, thiserror::Error)]
pub enum VirtualBusError {
    #[error("virtual gateway is unreachable")]
    Unreachable,

    #[error("virtual link is down")]
    LinkDown,
}

impl From<VirtualBusError> for HubError {
    fn from(err: VirtualBusError) -> Self {
        Self::Transport(Box::new(err))
    }
}
