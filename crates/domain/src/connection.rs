//! Bus connection lifecycle states.
//!
//! `Disconnected → Connecting → Connected → Disconnected → …` with no
//! terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the bus connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Start a connection attempt.
    ///
    /// # Errors
    ///
    /// Only allowed from [`ConnectionState::Disconnected`].
    pub fn to_connecting(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Disconnected => Ok(Self::Connecting),
            from => Err(InvalidTransition {
                from,
                to: Self::Connecting,
            }),
        }
    }

    /// Complete a connection attempt.
    ///
    /// # Errors
    ///
    /// Only allowed from [`ConnectionState::Connecting`].
    pub fn to_connected(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Connecting => Ok(Self::Connected),
            from => Err(InvalidTransition {
                from,
                to: Self::Connected,
            }),
        }
    }

    /// Drop the connection, from any state.
    #[must_use]
    pub fn to_disconnected(self) -> Self {
        Self::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_cycle_through_lifecycle() {
        let state = ConnectionState::default();
        let state = state.to_connecting().unwrap();
        let state = state.to_connected().unwrap();
        assert!(state.is_connected());
        let state = state.to_disconnected();
        assert_eq!(state.to_connecting(), Ok(ConnectionState::Connecting));
    }

    #[test]
    fn should_reject_connected_without_connecting() {
        let result = ConnectionState::Disconnected.to_connected();
        assert_eq!(
            result,
            Err(InvalidTransition {
                from: ConnectionState::Disconnected,
                to: ConnectionState::Connected
            })
        );
    }

    #[test]
    fn should_reject_connecting_twice() {
        assert!(ConnectionState::Connecting.to_connecting().is_err());
        assert!(ConnectionState::Connected.to_connecting().is_err());
    }
}
