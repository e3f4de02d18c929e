//! # knxhub-adapter-web-reqwest
//!
//! Outbound HTTP using [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - `WebhookCaller`: plain GET on a webhook URL, any 2xx counts as delivered
//! - `SensorSource`: GET a sensor endpoint and hand back its body text
//!
//! ## Dependency rule
//! Depends on `knxhub-app` (for port traits) and `knxhub-domain` (for the error type).

mod client;
mod error;

pub use client::{HttpClient, HttpClientConfig};
pub use error::WebError;
