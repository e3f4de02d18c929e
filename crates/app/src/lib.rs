//! # knxhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `BusConnector` / `BusConnection`: the bus transport
//!   - `StateChangeSink`: durable append of state changes
//!   - `WebhookCaller`: outbound webhook GETs
//!   - `SensorSource`: external sensor endpoint fetches
//! - Provide the **telegram dispatch engine**: `RoleResolver`, `StateStore`,
//!   `NotificationTrigger` and the `Dispatcher` that chains them
//! - Own the bus connection lifecycle (`ConnectionSupervisor`, `BusHandle`)
//! - Run background work: `ResyncDriver` and `EnvironmentalBridge`
//! - Expose the caller-facing use-cases through `BridgeService`
//!
//! ## Dependency rule
//! Depends on `knxhub-domain` only (plus `tokio` for tasks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bus_handle;
pub mod dispatcher;
pub mod env_bridge;
pub mod notification;
pub mod ports;
pub mod resolver;
pub mod resync;
pub mod services;
pub mod state_store;
pub mod supervisor;
