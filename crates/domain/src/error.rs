//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries via `From`.

use std::error::Error as StdError;

use crate::address::GroupAddress;
use crate::datapoint::DatapointError;
use crate::role::Role;

/// Boxed error source carried by infrastructure variants.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error returned by ports and application services.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// No bus connection is currently installed.
    #[error("bus connection not available")]
    BusUnavailable,

    /// A bounded bus request did not complete in time.
    #[error("bus request to {address} timed out after {timeout_ms} ms")]
    Timeout {
        address: GroupAddress,
        timeout_ms: u64,
    },

    /// The bus transport rejected a request or dropped the link.
    #[error("bus transport error")]
    Transport(#[source] BoxError),

    /// The persistence backend failed.
    #[error("storage error")]
    Storage(#[source] BoxError),

    /// An outbound HTTP call (webhook, sensor endpoint) failed.
    #[error("outbound call failed")]
    Outbound(#[source] BoxError),
}

impl HubError {
    /// Whether the error means the bus could not be reached at all.
    #[must_use]
    pub fn is_bus_unavailable(&self) -> bool {
        matches!(self, Self::BusUnavailable | Self::Transport(_))
    }
}

/// Invariant violations detected before any IO happens.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device name must not be empty")]
    EmptyName,

    #[error("device id {0} is declared more than once")]
    DuplicateDeviceId(String),

    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(u8),

    #[error("power state must be ON or OFF, got {0:?}")]
    InvalidPowerState(String),

    #[error("{0:?} is not a number")]
    InvalidNumber(String),

    #[error("device {device_id} has no {role} address")]
    MissingAddress { device_id: String, role: Role },

    #[error("value cannot be encoded")]
    Datapoint(#[from] DatapointError),
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} does not exist")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error_via_from() {
        let err: HubError = ValidationError::PercentageOutOfRange(120).into();
        assert!(matches!(
            err,
            HubError::Validation(ValidationError::PercentageOutOfRange(120))
        ));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "kitchen".to_string(),
        };
        assert_eq!(err.to_string(), "Device kitchen does not exist");
    }

    #[test]
    fn should_display_missing_address_with_role() {
        let err = ValidationError::MissingAddress {
            device_id: "hall".to_string(),
            role: Role::PercentageWrite,
        };
        assert_eq!(err.to_string(), "device hall has no percentage-write address");
    }

    #[test]
    fn should_classify_transport_as_bus_unavailable() {
        let err = HubError::Transport("link down".into());
        assert!(err.is_bus_unavailable());
        assert!(HubError::BusUnavailable.is_bus_unavailable());
        assert!(!HubError::Storage("disk full".into()).is_bus_unavailable());
    }
}
