use knxhub_domain::error::HubError;

/// Errors raised by outbound HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Building the client, connecting or reading the body failed.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

impl From<WebError> for HubError {
    fn from(err: WebError) -> Self {
        Self::Outbound(Box::new(err))
    }
}
