//! Sensor source port: fetch the raw response line of a sensor endpoint.

use std::future::Future;

use knxhub_domain::error::HubError;

/// Fetches sensor endpoint responses.
pub trait SensorSource: Send + Sync {
    /// GET `url` and return the response body.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, HubError>> + Send;
}
