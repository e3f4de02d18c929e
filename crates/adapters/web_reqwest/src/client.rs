use std::time::Duration;

use knxhub_app::ports::{SensorSource, WebhookCaller};
use knxhub_domain::error::HubError;

use crate::error::WebError;

#[derive(Debug, Clone, Copy)]
pub struct HttpClientConfig {
    /// Upper bound for a whole request, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

/// Shared HTTP client for webhooks and sensor endpoints.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Request`] if the TLS backend cannot be initialised.
    pub fn new(config: HttpClientConfig) -> Result<Self, WebError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|source| WebError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, WebError> {
        let request_error = |source| WebError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl WebhookCaller for HttpClient {
    async fn call(&self, url: &str) -> Result<(), HubError> {
        let response = self.get(url).await?;
        tracing::debug!(%url, status = response.status().as_u16(), "webhook answered");
        Ok(())
    }
}

impl SensorSource for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, HubError> {
        let response = self.get(url).await?;
        let body = response.text().await.map_err(|source| WebError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(body)
    }
}
