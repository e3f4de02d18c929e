//! # knxhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON REST API** (`/devices`, `/devices/current-states`,
//!   `/devices/state-history`, `/device/{id}/set/...`, `/devices/resync`)
//! - Guard every route but `/health` with the `AUTH_CODE` header check
//! - Map HTTP requests into [`BridgeService`](knxhub_app::services::bridge_service::BridgeService)
//!   calls and their results into HTTP responses
//!
//! ## Dependency rule
//! Depends on `knxhub-app` (services and port traits) and `knxhub-domain`
//! (types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;
