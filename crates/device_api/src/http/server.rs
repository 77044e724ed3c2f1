use crate::http::{configure_device, health, send_command, ApiState};
use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone, Debug)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/devices/:device_id/config", post(configure_device))
        .route("/devices/:device_id/command", post(send_command))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

/// Serve the operator API until `ctx` is cancelled, then drain in-flight
/// requests.
pub async fn run_http_server(
    config: HttpServerConfig,
    state: ApiState,
    ctx: CancellationToken,
) -> anyhow::Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", address))?;

    info!(address = %address, "HTTP control surface listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { ctx.cancelled().await })
        .await
        .context("HTTP server failed")?;

    info!("HTTP control surface stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperatorService;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use common::domain::{
        DeviceIdentity, DeviceRegistry, DomainError, MockDeviceCommandSender,
        MockDeviceConfigUpdater,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn registry_with_device() -> Arc<DeviceRegistry> {
        let registry = Arc::new(DeviceRegistry::new());
        registry
            .get_or_create(&DeviceIdentity::new(
                "thermo-1",
                "greenhouse",
                "europe-west1",
                "acme",
            ))
            .await;
        registry
    }

    fn router(
        registry: Arc<DeviceRegistry>,
        sender: MockDeviceCommandSender,
        updater: MockDeviceConfigUpdater,
    ) -> Router {
        build_router(ApiState {
            operator_service: Arc::new(OperatorService::new(
                registry,
                Arc::new(sender),
                Arc::new(updater),
            )),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_configure_known_device() {
        let mut updater = MockDeviceConfigUpdater::new();
        updater
            .expect_update_config()
            .times(1)
            .returning(|_, _| Ok(2));

        let registry = registry_with_device().await;
        let app = router(registry.clone(), MockDeviceCommandSender::new(), updater);

        let response = app
            .oneshot(post_json(
                "/devices/thermo-1/config",
                r#"{"min_temp":15,"max_temp":22,"ping_period":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "status": "ok", "config_version": 2 })
        );
        assert_eq!(
            registry
                .snapshot("thermo-1")
                .await
                .unwrap()
                .configuration
                .max_temperature,
            22
        );
    }

    #[tokio::test]
    async fn test_configure_unknown_device_returns_ok_without_dispatch() {
        let mut updater = MockDeviceConfigUpdater::new();
        updater.expect_update_config().never();

        let registry = Arc::new(DeviceRegistry::new());
        let app = router(registry.clone(), MockDeviceCommandSender::new(), updater);

        let response = app
            .oneshot(post_json(
                "/devices/ghost/config",
                r#"{"min_temp":15,"max_temp":22,"ping_period":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "status": "device_not_found" })
        );
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_body_returns_error_envelope() {
        let app = router(
            registry_with_device().await,
            MockDeviceCommandSender::new(),
            MockDeviceConfigUpdater::new(),
        );

        let response = app
            .oneshot(post_json("/devices/thermo-1/command", r#"{"ac":"on"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], 400);
        assert!(body["error_message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_invalid_configuration_returns_bad_request() {
        let app = router(
            registry_with_device().await,
            MockDeviceCommandSender::new(),
            MockDeviceConfigUpdater::new(),
        );

        let response = app
            .oneshot(post_json(
                "/devices/thermo-1/config",
                r#"{"min_temp":25,"max_temp":20,"ping_period":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_code"], 400);
    }

    #[tokio::test]
    async fn test_command_dispatch_failure_returns_internal_error() {
        let mut sender = MockDeviceCommandSender::new();
        sender.expect_send_command().returning(|path, _| {
            Err(DomainError::CommandDispatchFailed {
                device_path: path.to_string(),
                reason: "503".to_string(),
            })
        });

        let app = router(
            registry_with_device().await,
            sender,
            MockDeviceConfigUpdater::new(),
        );

        let response = app
            .oneshot(post_json("/devices/thermo-1/command", r#"{"ac":true}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], 500);
        assert_eq!(body["error_message"], "failed to deliver command to device");
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(
            Arc::new(DeviceRegistry::new()),
            MockDeviceCommandSender::new(),
            MockDeviceConfigUpdater::new(),
        );

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_server_stops_on_cancellation() {
        let state = ApiState {
            operator_service: Arc::new(OperatorService::new(
                Arc::new(DeviceRegistry::new()),
                Arc::new(MockDeviceCommandSender::new()),
                Arc::new(MockDeviceConfigUpdater::new()),
            )),
        };
        let config = HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };

        let ctx = CancellationToken::new();
        let server = tokio::spawn(run_http_server(config, state, ctx.clone()));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        ctx.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server should stop after cancellation")
            .unwrap();
        assert!(result.is_ok());
    }
}
