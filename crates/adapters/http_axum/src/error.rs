//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use knxhub_domain::error::{HubError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HubError`] to an HTTP response with appropriate status code.
pub struct ApiError(HubError);

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            HubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            HubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            HubError::BusUnavailable | HubError::Timeout { .. } | HubError::Transport(_) => {
                tracing::warn!(error = ?self.0, "bus request failed");
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
            HubError::Storage(_) | HubError::Outbound(_) => {
                tracing::error!(error = ?self.0, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knxhub_domain::error::NotFoundError;

    fn status_of(err: HubError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn should_map_errors_to_status_codes() {
        assert_eq!(
            status_of(ValidationError::PercentageOutOfRange(120).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                NotFoundError {
                    entity: "Device",
                    id: "ghost".to_string(),
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(HubError::BusUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(HubError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
