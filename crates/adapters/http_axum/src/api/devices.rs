//! Read-only device endpoints and the resync trigger.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use knxhub_app::ports::{BusConnection, StateChangeSink};
use knxhub_domain::device::Device;
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::DeviceState;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the current-states endpoint.
pub enum StatesResponse {
    Ok(Json<Vec<DeviceState>>),
}

impl IntoResponse for StatesResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the history endpoint.
pub enum HistoryResponse {
    Ok(Json<Vec<HistoryEntry>>),
}

impl IntoResponse for HistoryResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

#[derive(Serialize)]
pub struct ResyncBody {
    /// `false` when a run was already in progress.
    pub started: bool,
}

/// Possible responses from the resync endpoint.
pub enum ResyncResponse {
    Accepted(Json<ResyncBody>),
}

impl IntoResponse for ResyncResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `GET /devices`
pub async fn list<P, C>(State(state): State<AppState<P, C>>) -> ListResponse
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    ListResponse::Ok(Json(state.service.list_devices().to_vec()))
}

/// `GET /devices/current-states`
pub async fn current_states<P, C>(State(state): State<AppState<P, C>>) -> StatesResponse
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    StatesResponse::Ok(Json(state.service.current_states()))
}

/// `GET /devices/state-history`
pub async fn history<P, C>(State(state): State<AppState<P, C>>) -> HistoryResponse
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    HistoryResponse::Ok(Json(state.service.history()))
}

/// `POST /devices/resync`
pub async fn resync<P, C>(State(state): State<AppState<P, C>>) -> Result<ResyncResponse, ApiError>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    let started = state.service.resync()?;
    if !started {
        tracing::debug!("resync already running");
    }
    Ok(ResyncResponse::Accepted(Json(ResyncBody { started })))
}
