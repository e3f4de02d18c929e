//! Telegrams: application-layer messages exchanged on the bus.

use serde::{Deserialize, Serialize};

use crate::address::GroupAddress;

/// Group service a telegram carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelegramKind {
    Read,
    Response,
    Write,
}

/// A message addressed to a group address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telegram {
    pub destination: GroupAddress,
    pub kind: TelegramKind,
    pub payload: Vec<u8>,
}

impl Telegram {
    #[must_use]
    pub fn write(destination: GroupAddress, payload: Vec<u8>) -> Self {
        Self {
            destination,
            kind: TelegramKind::Write,
            payload,
        }
    }

    #[must_use]
    pub fn response(destination: GroupAddress, payload: Vec<u8>) -> Self {
        Self {
            destination,
            kind: TelegramKind::Response,
            payload,
        }
    }

    #[must_use]
    pub fn read(destination: GroupAddress) -> Self {
        Self {
            destination,
            kind: TelegramKind::Read,
            payload: Vec::new(),
        }
    }

    /// Whether the telegram reports a value (a write or a read response with
    /// a payload).
    #[must_use]
    pub fn carries_value(&self) -> bool {
        self.kind != TelegramKind::Read && !self.payload.is_empty()
    }
}
