//! Webhook port: fire a plain GET at a URL.

use std::future::Future;

use knxhub_domain::error::HubError;

/// Performs outbound webhook calls.
pub trait WebhookCaller: Send + Sync {
    /// Call `url`. Any non-success answer is an error.
    fn call(&self, url: &str) -> impl Future<Output = Result<(), HubError>> + Send;
}
