//! Three-level group addresses (`main/middle/sub`).
//!
//! A group address is a 16-bit bus destination laid out as
//! `MMMMM III SSSSSSSS`: 5 bits main group, 3 bits middle group and
//! 8 bits sub group.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MAX_MAIN: u16 = 0x1F;
const MAX_MIDDLE: u16 = 0x07;
const MAX_SUB: u16 = 0xFF;

/// Destination identifier of a telegram on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupAddress(u16);

/// Why a group address string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("group address {0:?} must have the form main/middle/sub")]
    Format(String),

    #[error("{level} group {value} exceeds {max} in {input:?}")]
    OutOfRange {
        input: String,
        level: &'static str,
        value: u16,
        max: u16,
    },
}

impl GroupAddress {
    /// Build an address from its three levels.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::OutOfRange`] if a level exceeds its bit width.
    pub fn new(main: u16, middle: u16, sub: u16) -> Result<Self, AddressError> {
        let input = format!("{main}/{middle}/{sub}");
        check(&input, "main", main, MAX_MAIN)?;
        check(&input, "middle", middle, MAX_MIDDLE)?;
        check(&input, "sub", sub, MAX_SUB)?;
        Ok(Self((main << 11) | (middle << 8) | sub))
    }

    /// Wrap a raw 16-bit address as seen on the wire.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw 16-bit value.
    #[must_use]
    pub fn raw(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn main(self) -> u16 {
        self.0 >> 11
    }

    #[must_use]
    pub fn middle(self) -> u16 {
        (self.0 >> 8) & MAX_MIDDLE
    }

    #[must_use]
    pub fn sub(self) -> u16 {
        self.0 & MAX_SUB
    }
}

fn check(input: &str, level: &'static str, value: u16, max: u16) -> Result<(), AddressError> {
    if value > max {
        return Err(AddressError::OutOfRange {
            input: input.to_string(),
            level,
            value,
            max,
        });
    }
    Ok(())
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl FromStr for GroupAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || AddressError::Format(s.to_string());
        let mut parts = s.trim().split('/');
        let mut level = || -> Result<u16, AddressError> {
            parts
                .next()
                .and_then(|part| part.parse().ok())
                .ok_or_else(format_err)
        };
        let (main, middle, sub) = (level()?, level()?, level()?);
        if parts.next().is_some() {
            return Err(format_err());
        }
        Self::new(main, middle, sub)
    }
}

impl TryFrom<String> for GroupAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupAddress> for String {
    fn from(value: GroupAddress) -> Self {
        value.to_string()
    }
}
