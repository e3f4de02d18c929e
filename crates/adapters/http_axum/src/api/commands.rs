//! Device command endpoints.
//!
//! The value travels in the path, e.g.
//! `GET /device/kitchen/set/percentage/value/40`. Each command answers with
//! the history entry it recorded.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use knxhub_app::ports::{BusConnection, StateChangeSink};
use knxhub_domain::error::ValidationError;
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::PowerState;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the command endpoints.
pub enum CommandResponse {
    Ok(Json<HistoryEntry>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, ValidationError> {
    value
        .parse()
        .map_err(|_| ValidationError::InvalidNumber(value.to_string()))
}

/// `GET /device/{id}/set/power-state/value/{ON|OFF}`
pub async fn set_power_state<P, C>(
    State(state): State<AppState<P, C>>,
    Path((id, value)): Path<(String, String)>,
) -> Result<CommandResponse, ApiError>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    let power = PowerState::from_str(&value)?;
    let entry = state.service.set_power_state(&id, power).await?;
    Ok(CommandResponse::Ok(Json(entry)))
}

/// `GET /device/{id}/set/percentage/value/{0..100}`
pub async fn set_percentage<P, C>(
    State(state): State<AppState<P, C>>,
    Path((id, value)): Path<(String, String)>,
) -> Result<CommandResponse, ApiError>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    let percent: u8 = parse_number(&value)?;
    let entry = state.service.set_percentage(&id, percent).await?;
    Ok(CommandResponse::Ok(Json(entry)))
}

/// `GET /device/{id}/set/target-temperature/value/{celsius}`
pub async fn set_target_temperature<P, C>(
    State(state): State<AppState<P, C>>,
    Path((id, value)): Path<(String, String)>,
) -> Result<CommandResponse, ApiError>
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    let celsius: f64 = parse_number(&value)?;
    let entry = state.service.set_target_temperature(&id, celsius).await?;
    Ok(CommandResponse::Ok(Json(entry)))
}
