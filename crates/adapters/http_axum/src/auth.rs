//! `AUTH_CODE` header check.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Request header carrying the shared secret.
pub const AUTH_HEADER: &str = "AUTH_CODE";

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Missing,
    Wrong,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "No AUTH_CODE provided.",
            Self::Wrong => "Wrong AUTH_CODE.",
        };
        (StatusCode::FORBIDDEN, message).into_response()
    }
}

/// Rejects requests whose `AUTH_CODE` header does not match the loaded code.
///
/// Without a loaded code every request is rejected.
pub async fn require_auth_code<P, C>(
    State(state): State<AppState<P, C>>,
    headers: HeaderMap,
    req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let provided = headers
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthRejection::Missing)?;

    match state.auth_code.as_deref() {
        Some(expected) if expected == provided => Ok(next.run(req).await),
        _ => {
            tracing::debug!(path = %req.uri().path(), "rejected request with wrong auth code");
            Err(AuthRejection::Wrong)
        }
    }
}
