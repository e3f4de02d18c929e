//! External sensor endpoints polled by the environmental bridge.
//!
//! An endpoint answers a plain GET with a single `key=value,key=value` line,
//! for example `ret=OK,htemp=20.0,hhum=-,otemp=6.0`.

use serde::{Deserialize, Serialize};

use crate::address::GroupAddress;

/// Where to fetch a reading and which bus addresses to relay it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorEndpoint {
    pub url: String,
    #[serde(default = "default_indoor_key")]
    pub indoor_key: String,
    #[serde(default = "default_outdoor_key")]
    pub outdoor_key: String,
    #[serde(rename = "gaIndoorTemperature")]
    pub indoor_address: GroupAddress,
    #[serde(rename = "gaOutdoorTemperature")]
    pub outdoor_address: GroupAddress,
}

fn default_indoor_key() -> String {
    "htemp".to_string()
}

fn default_outdoor_key() -> String {
    "otemp".to_string()
}

/// Indoor and outdoor temperatures reported by one endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub indoor: f64,
    pub outdoor: f64,
}

/// Why a response line could not be turned into a [`SensorReading`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorParseError {
    #[error("endpoint reported status {0:?}")]
    NotOk(String),

    #[error("response has no {0:?} key")]
    MissingKey(String),

    #[error("value {value:?} for {key:?} is not a number")]
    InvalidNumber { key: String, value: String },
}

impl SensorEndpoint {
    /// Extract this endpoint's two temperatures from a response line.
    ///
    /// # Errors
    ///
    /// Returns [`SensorParseError`] when the line reports a failure, lacks
    /// a key, or carries a non-numeric value.
    pub fn parse(&self, line: &str) -> Result<SensorReading, SensorParseError> {
        let pairs: Vec<(&str, &str)> = line
            .trim()
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect();

        if let Some((_, status)) = pairs.iter().find(|(key, _)| *key == "ret")
            && *status != "OK"
        {
            return Err(SensorParseError::NotOk((*status).to_string()));
        }

        let number = |wanted: &str| -> Result<f64, SensorParseError> {
            let (_, value) = pairs
                .iter()
                .find(|(key, _)| *key == wanted)
                .ok_or_else(|| SensorParseError::MissingKey(wanted.to_string()))?;
            value.parse().map_err(|_| SensorParseError::InvalidNumber {
                key: wanted.to_string(),
                value: (*value).to_string(),
            })
        };

        Ok(SensorReading {
            indoor: number(&self.indoor_key)?,
            outdoor: number(&self.outdoor_key)?,
        })
    }
}
