//! Payload decoder: turns the raw payload seen on a role's address into a
//! typed value.
//!
//! The datapoint is chosen by [`Role::datapoint`], so adding a role only
//! touches that table.

use std::fmt::Write as _;

use crate::address::GroupAddress;
use crate::datapoint::{DatapointError, DatapointValue};
use crate::role::Role;

/// A payload that does not fit the datapoint its role expects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{address} ({role}) payload {raw_hex} is not {datapoint}", datapoint = .role.datapoint())]
pub struct DecodeError {
    pub role: Role,
    pub address: GroupAddress,
    pub raw_hex: String,
    #[source]
    pub source: DatapointError,
}

/// Decode `data` received on `address` according to `role`.
///
/// # Errors
///
/// Returns [`DecodeError`] carrying the role, address and the payload as
/// hex when the payload is malformed.
pub fn decode(role: Role, address: GroupAddress, data: &[u8]) -> Result<DatapointValue, DecodeError> {
    role.datapoint().decode(data).map_err(|source| DecodeError {
        role,
        address,
        raw_hex: to_hex(data),
        source,
    })
}

/// Uppercase hex rendering of a payload, e.g. `0C1A`.
#[must_use]
pub fn to_hex(data: &[u8]) -> String {
    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02X}");
        out
    })
}
