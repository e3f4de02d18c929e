//! Application services: the boundary operations exposed to the REST layer.
//!
//! Services take port implementations through generic parameters so that
//! this layer never depends on a concrete adapter.

pub mod bridge_service;
