//! Axum router assembly.

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use knxhub_app::ports::{BusConnection, StateChangeSink};

use crate::auth::require_auth_code;
use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// `/health` is open; every API route sits behind the `AUTH_CODE` check.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<P, C>(state: AppState<P, C>) -> Router
where
    P: StateChangeSink + 'static,
    C: BusConnection + 'static,
{
    let api = crate::api::routes::<P, C>().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_auth_code::<P, C>,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use knxhub_app::bus_handle::BusHandle;
    use knxhub_app::resync::{ResyncConfig, ResyncDriver};
    use knxhub_app::services::bridge_service::BridgeService;
    use knxhub_app::state_store::StateStore;
    use knxhub_domain::address::GroupAddress;
    use knxhub_domain::catalog::DeviceCatalog;
    use knxhub_domain::device::Device;
    use knxhub_domain::error::HubError;
    use knxhub_domain::history::HistoryEntry;
    use knxhub_domain::role::Role;

    const CODE: &str = "s3cr3t";

    struct NullSink;

    impl StateChangeSink for NullSink {
        async fn append(&self, _entry: &HistoryEntry) -> Result<(), HubError> {
            Ok(())
        }
    }

    struct NoConnection;

    impl BusConnection for NoConnection {
        fn is_alive(&self) -> bool {
            false
        }
        async fn send_write(&self, _address: GroupAddress, _payload: Vec<u8>) -> Result<(), HubError> {
            Err(HubError::BusUnavailable)
        }
        async fn send_read(&self, _address: GroupAddress) -> Result<(), HubError> {
            Err(HubError::BusUnavailable)
        }
        async fn close(&self) {}
    }

    fn test_state(auth_code: Option<&str>) -> AppState<NullSink, NoConnection> {
        let catalog = Arc::new(
            DeviceCatalog::new(vec![
                Device::builder()
                    .id("lamp")
                    .name("Lamp")
                    .address(Role::PowerWrite, "0/0/1".parse().unwrap())
                    .address(Role::PowerStatus, "0/0/2".parse().unwrap())
                    .build()
                    .unwrap(),
            ])
            .unwrap(),
        );
        let bus = BusHandle::new();
        let resync = ResyncDriver::new(Arc::clone(&catalog), bus.clone(), ResyncConfig::default());
        let service = BridgeService::new(catalog, Arc::new(StateStore::new(NullSink)), bus, resync);
        AppState::new(Arc::new(service), auth_code.map(str::to_string))
    }

    fn get(uri: &str, code: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(code) = code {
            builder = builder.header("AUTH_CODE", code);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state(Some(CODE)));

        let response = app.oneshot(get("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn should_reject_request_without_auth_code() {
        let app = build(test_state(Some(CODE)));

        let response = app.oneshot(get("/devices", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "No AUTH_CODE provided.");
    }

    #[tokio::test]
    async fn should_reject_request_with_wrong_auth_code() {
        let app = build(test_state(Some(CODE)));

        let response = app.oneshot(get("/devices", Some("guess"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "Wrong AUTH_CODE.");
    }

    #[tokio::test]
    async fn should_reject_everything_when_no_code_loaded() {
        let app = build(test_state(None));

        let response = app.oneshot(get("/devices", Some(CODE))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_list_devices_as_json() {
        let app = build(test_state(Some(CODE)));

        let response = app.oneshot(get("/devices", Some(CODE))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json[0]["id"], "lamp");
        assert_eq!(json[0]["gaPowerStateWrite"], "0/0/1");
    }

    #[tokio::test]
    async fn should_return_empty_states_and_history_before_any_telegram() {
        let app = build(test_state(Some(CODE)));

        let states = app
            .clone()
            .oneshot(get("/devices/current-states", Some(CODE)))
            .await
            .unwrap();
        let history = app
            .oneshot(get("/devices/state-history", Some(CODE)))
            .await
            .unwrap();

        assert_eq!(body_text(states).await, "[]");
        assert_eq!(body_text(history).await, "[]");
    }

    #[tokio::test]
    async fn should_return_bad_request_for_invalid_values() {
        let app = build(test_state(Some(CODE)));

        let power = app
            .clone()
            .oneshot(get("/device/lamp/set/power-state/value/MAYBE", Some(CODE)))
            .await
            .unwrap();
        let percent = app
            .clone()
            .oneshot(get("/device/lamp/set/percentage/value/abc", Some(CODE)))
            .await
            .unwrap();
        let too_high = app
            .oneshot(get("/device/lamp/set/percentage/value/101", Some(CODE)))
            .await
            .unwrap();

        assert_eq!(power.status(), StatusCode::BAD_REQUEST);
        assert_eq!(percent.status(), StatusCode::BAD_REQUEST);
        assert_eq!(too_high.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_device() {
        let app = build(test_state(Some(CODE)));

        let response = app
            .oneshot(get("/device/ghost/set/power-state/value/ON", Some(CODE)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Device ghost does not exist");
    }

    #[tokio::test]
    async fn should_return_service_unavailable_without_bus() {
        let app = build(test_state(Some(CODE)));

        let command = app
            .clone()
            .oneshot(get("/device/lamp/set/power-state/value/ON", Some(CODE)))
            .await
            .unwrap();
        let resync = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/devices/resync")
                    .header("AUTH_CODE", CODE)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(command.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resync.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
