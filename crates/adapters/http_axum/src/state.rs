//! Shared application state for axum handlers.

use std::sync::Arc;

use knxhub_app::ports::{BusConnection, StateChangeSink};
use knxhub_app::services::bridge_service::BridgeService;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so neither the sink nor the connection
/// type has to be `Clone`.
pub struct AppState<P, C> {
    /// Caller-facing operations of the bridge.
    pub service: Arc<BridgeService<P, C>>,
    /// Expected `AUTH_CODE` header. `None` rejects every guarded request.
    pub auth_code: Option<Arc<str>>,
}

impl<P, C> Clone for AppState<P, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth_code: self.auth_code.clone(),
        }
    }
}

impl<P, C> AppState<P, C>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    pub fn new(service: Arc<BridgeService<P, C>>, auth_code: Option<String>) -> Self {
        Self {
            service,
            auth_code: auth_code.map(Arc::from),
        }
    }
}
