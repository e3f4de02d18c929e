//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::Router;
use axum::routing::{get, post};

use knxhub_app::ports::{BusConnection, StateChangeSink};

use crate::state::AppState;

/// Build the guarded API routes.
pub fn routes<P, C>() -> Router<AppState<P, C>>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    Router::new()
        .route("/devices", get(devices::list::<P, C>))
        .route("/devices/current-states", get(devices::current_states::<P, C>))
        .route("/devices/state-history", get(devices::history::<P, C>))
        .route("/devices/resync", post(devices::resync::<P, C>))
        .route(
            "/device/{id}/set/power-state/value/{value}",
            get(commands::set_power_state::<P, C>),
        )
        .route(
            "/device/{id}/set/percentage/value/{value}",
            get(commands::set_percentage::<P, C>),
        )
        .route(
            "/device/{id}/set/target-temperature/value/{value}",
            get(commands::set_target_temperature::<P, C>),
        )
}
