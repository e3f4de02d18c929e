//! Datapoint codecs for the three payload formats the bridge understands.
//!
//! Pure functions over `&[u8]`:
//!
//! | Datapoint | Id | Size | Meaning |
//! |-----------|----|------|---------|
//! | [`Datapoint::Switch`] | DPT 1.001 | 1 byte | bit 0 is the boolean |
//! | [`Datapoint::Scaling`] | DPT 5.001 | 1 byte | 0..=255 mapped onto 0..=100 % |
//! | [`Datapoint::Float16`] | DPT 9.xxx | 2 bytes | `0.01 * M * 2^E`, big-endian |
//!
//! Scaling rounds to the nearest integer in both directions, so every
//! percentage survives an encode/decode round trip (50 % is byte 128).

use std::fmt;

use serde::{Deserialize, Serialize};

const FLOAT16_INVALID: u16 = 0x7FFF;
const FLOAT16_MIN: f64 = -671_088.64;
const FLOAT16_MAX: f64 = 670_760.96;
const MANTISSA_MIN: i64 = -2048;
const MANTISSA_MAX: i64 = 2047;
const EXPONENT_MAX: u16 = 15;

/// Payload format of a group address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datapoint {
    Switch,
    Scaling,
    Float16,
}

/// A decoded datapoint value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatapointValue {
    Switch(bool),
    Scaling(u8),
    Float16(f64),
}

/// Why a payload could not be decoded or a value could not be encoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatapointError {
    #[error("{datapoint} payload must be {expected} bytes, got {actual}")]
    WrongLength {
        datapoint: Datapoint,
        expected: usize,
        actual: usize,
    },

    #[error("{0} payload carries the invalid-data marker")]
    InvalidData(Datapoint),

    #[error("percentage {0} is outside 0..=100")]
    ScalingOutOfRange(u8),

    #[error("{0} is outside the 2-byte float range")]
    FloatOutOfRange(f64),

    #[error("value is not a finite number")]
    NotFinite,
}

impl Datapoint {
    /// Payload size in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Switch | Self::Scaling => 1,
            Self::Float16 => 2,
        }
    }

    /// Decode a raw payload of this datapoint.
    ///
    /// # Errors
    ///
    /// Returns [`DatapointError::WrongLength`] when the payload size does not
    /// match, or [`DatapointError::InvalidData`] for the float invalid marker.
    pub fn decode(self, data: &[u8]) -> Result<DatapointValue, DatapointError> {
        if data.len() != self.size() {
            return Err(DatapointError::WrongLength {
                datapoint: self,
                expected: self.size(),
                actual: data.len(),
            });
        }
        match self {
            Self::Switch => Ok(DatapointValue::Switch(data[0] & 0x01 == 0x01)),
            Self::Scaling => Ok(DatapointValue::Scaling(scaling_to_percent(data[0]))),
            Self::Float16 => {
                decode_float16(u16::from_be_bytes([data[0], data[1]])).map(DatapointValue::Float16)
            }
        }
    }
}

impl fmt::Display for Datapoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("DPT1.001"),
            Self::Scaling => f.write_str("DPT5.001"),
            Self::Float16 => f.write_str("DPT9"),
        }
    }
}

impl DatapointValue {
    /// Datapoint this value belongs to.
    #[must_use]
    pub fn datapoint(self) -> Datapoint {
        match self {
            Self::Switch(_) => Datapoint::Switch,
            Self::Scaling(_) => Datapoint::Scaling,
            Self::Float16(_) => Datapoint::Float16,
        }
    }

    /// Encode into the wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`DatapointError`] when the value cannot be represented.
    pub fn encode(self) -> Result<Vec<u8>, DatapointError> {
        match self {
            Self::Switch(on) => Ok(vec![u8::from(on)]),
            Self::Scaling(percent) => percent_to_scaling(percent).map(|raw| vec![raw]),
            Self::Float16(value) => encode_float16(value).map(|raw| raw.to_be_bytes().to_vec()),
        }
    }
}

fn scaling_to_percent(raw: u8) -> u8 {
    let percent = (u16::from(raw) * 100 + 127) / 255;
    // at most 100
    u8::try_from(percent).unwrap_or(100)
}

fn percent_to_scaling(percent: u8) -> Result<u8, DatapointError> {
    if percent > 100 {
        return Err(DatapointError::ScalingOutOfRange(percent));
    }
    let raw = (u16::from(percent) * 255 + 50) / 100;
    Ok(u8::try_from(raw).unwrap_or(u8::MAX))
}

fn decode_float16(raw: u16) -> Result<f64, DatapointError> {
    if raw == FLOAT16_INVALID {
        return Err(DatapointError::InvalidData(Datapoint::Float16));
    }
    let exponent = (raw >> 11) & 0x0F;
    let mut mantissa = i32::from(raw & 0x07FF);
    if raw & 0x8000 != 0 {
        mantissa -= 2048;
    }
    Ok(0.01 * f64::from(mantissa) * f64::from(1_u32 << exponent))
}

#[allow(clippy::cast_possible_truncation)]
fn encode_float16(value: f64) -> Result<u16, DatapointError> {
    if !value.is_finite() {
        return Err(DatapointError::NotFinite);
    }
    if !(FLOAT16_MIN..=FLOAT16_MAX).contains(&value) {
        return Err(DatapointError::FloatOutOfRange(value));
    }
    let hundredths = value * 100.0;
    let mut exponent = 0_u16;
    let mut mantissa = hundredths.round() as i64;
    while !(MANTISSA_MIN..=MANTISSA_MAX).contains(&mantissa) {
        exponent += 1;
        if exponent > EXPONENT_MAX {
            return Err(DatapointError::FloatOutOfRange(value));
        }
        mantissa = (hundredths / f64::from(1_u32 << exponent)).round() as i64;
    }
    let sign = if mantissa < 0 { 0x8000 } else { 0 };
    let bits = (mantissa & 0x07FF) as u16;
    Ok(sign | (exponent << 11) | bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_switch_from_low_bit() {
        assert_eq!(
            Datapoint::Switch.decode(&[0x01]),
            Ok(DatapointValue::Switch(true))
        );
        assert_eq!(
            Datapoint::Switch.decode(&[0x00]),
            Ok(DatapointValue::Switch(false))
        );
        assert_eq!(
            Datapoint::Switch.decode(&[0xFE]),
            Ok(DatapointValue::Switch(false))
        );
    }

    #[test]
    fn should_reject_switch_with_wrong_length() {
        let result = Datapoint::Switch.decode(&[0x01, 0x00]);
        assert_eq!(
            result,
            Err(DatapointError::WrongLength {
                datapoint: Datapoint::Switch,
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn should_decode_scaling_byte_128_as_50_percent() {
        assert_eq!(
            Datapoint::Scaling.decode(&[128]),
            Ok(DatapointValue::Scaling(50))
        );
        assert_eq!(
            Datapoint::Scaling.decode(&[255]),
            Ok(DatapointValue::Scaling(100))
        );
        assert_eq!(
            Datapoint::Scaling.decode(&[0]),
            Ok(DatapointValue::Scaling(0))
        );
    }

    #[test]
    fn should_encode_50_percent_as_byte_128() {
        assert_eq!(DatapointValue::Scaling(50).encode(), Ok(vec![128]));
    }

    #[test]
    fn should_roundtrip_every_percentage() {
        for percent in 0..=100_u8 {
            let encoded = DatapointValue::Scaling(percent).encode().unwrap();
            assert_eq!(
                Datapoint::Scaling.decode(&encoded),
                Ok(DatapointValue::Scaling(percent)),
                "percent {percent}"
            );
        }
    }

    #[test]
    fn should_reject_percentage_above_100() {
        assert_eq!(
            DatapointValue::Scaling(101).encode(),
            Err(DatapointError::ScalingOutOfRange(101))
        );
    }

    #[test]
    fn should_decode_float16_positive_value() {
        // 0x0C1A: E=1, M=0x41A=1050 -> 0.01 * 1050 * 2 = 21.0
        let value = Datapoint::Float16.decode(&[0x0C, 0x1A]).unwrap();
        assert_eq!(value, DatapointValue::Float16(21.0));
    }

    #[test]
    fn should_decode_float16_negative_value() {
        // 0x8A24: sign set, E=1, M=0x224 -> (548 - 2048) = -1500 -> -30.0
        let value = Datapoint::Float16.decode(&[0x8A, 0x24]).unwrap();
        assert_eq!(value, DatapointValue::Float16(-30.0));
    }

    #[test]
    fn should_reject_float16_invalid_marker() {
        assert_eq!(
            Datapoint::Float16.decode(&[0x7F, 0xFF]),
            Err(DatapointError::InvalidData(Datapoint::Float16))
        );
    }

    #[test]
    fn should_reject_float16_with_single_byte() {
        assert!(matches!(
            Datapoint::Float16.decode(&[0x0C]),
            Err(DatapointError::WrongLength { expected: 2, .. })
        ));
    }

    #[test]
    fn should_encode_float16_with_smallest_exponent() {
        assert_eq!(
            DatapointValue::Float16(21.0).encode(),
            Ok(vec![0x0C, 0x1A])
        );
        assert_eq!(
            DatapointValue::Float16(-30.0).encode(),
            Ok(vec![0x8A, 0x24])
        );
        assert_eq!(DatapointValue::Float16(0.0).encode(), Ok(vec![0x00, 0x00]));
    }

    #[test]
    fn should_reject_float16_outside_range() {
        assert_eq!(
            DatapointValue::Float16(700_000.0).encode(),
            Err(DatapointError::FloatOutOfRange(700_000.0))
        );
        assert_eq!(
            DatapointValue::Float16(f64::NAN).encode(),
            Err(DatapointError::NotFinite)
        );
    }

    #[test]
    fn should_roundtrip_temperature_within_resolution() {
        let encoded = DatapointValue::Float16(22.5).encode().unwrap();
        let DatapointValue::Float16(decoded) = Datapoint::Float16.decode(&encoded).unwrap() else {
            panic!("expected a float");
        };
        assert!((decoded - 22.5).abs() < 0.02);
    }
}
