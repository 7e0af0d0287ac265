//! Front Door: the public HTTP surface.
//!
//! # Responsibilities
//! - Expose `GET /<pool>` for every configured pool
//! - Read the pool's latest selected target (never probe on this path)
//! - Delegate to the forwarder and translate failures to status codes
//! - Wire up middleware (tracing, request ID, overall deadline)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::http::forwarder::Forwarder;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::ProxyError;
use crate::load_balancer::pool::PoolManager;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pools: Arc<PoolManager>,
    pub forwarder: Forwarder,
}

/// HTTP server dispatching pool routes to their selected targets.
pub struct FrontDoor {
    router: Router,
}

impl FrontDoor {
    pub fn new(pools: Arc<PoolManager>, forwarder: Forwarder, config: &ListenerConfig) -> Self {
        let state = AppState { pools, forwarder };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{pool}", get(pool_handler))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Front door listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Front door draining");
            })
            .await?;

        tracing::info!("Front door stopped");
        Ok(())
    }
}

/// `GET /<pool>`: forward to the pool's current target.
async fn pool_handler(
    State(state): State<AppState>,
    Path(pool_name): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).unwrap_or("unknown");

    let Some(pool) = state.pools.get(&pool_name) else {
        tracing::debug!(request_id = %request_id, pool = %pool_name, "Unknown pool");
        return ProxyError::unknown_pool(&pool_name).into_response();
    };

    let target = pool.selected();
    let result = state
        .forwarder
        .forward(target.as_deref(), query.as_deref(), Some(request_id))
        .await;

    match result {
        Ok(body) => {
            if let Some(t) = &target {
                tracing::debug!(request_id = %request_id, pool = %pool_name, member = %t.member, "Forwarded");
            }
            metrics::record_request(&pool_name, 200, start);
            (
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response()
        }
        Err(e) => {
            let member = target.as_ref().map(|t| t.member.to_string()).unwrap_or_default();
            tracing::warn!(request_id = %request_id, pool = %pool_name, member = %member, error = %e, "Forward failed");
            let error = ProxyError::forward(&pool_name, &e);
            metrics::record_request(&pool_name, error.status.as_u16(), start);
            error.into_response()
        }
    }
}

async fn fallback_handler(uri: Uri) -> Response {
    ProxyError::no_route(uri.path()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForwardConfig, PoolConfig};
    use crate::load_balancer::pool::Pool;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn front_door() -> FrontDoor {
        let pools = Arc::new(PoolManager::new([Arc::new(Pool::new(
            &PoolConfig::new("cluster1"),
            vec![],
        ))]));
        FrontDoor::new(
            pools,
            Forwarder::new(&ForwardConfig::default()),
            &ListenerConfig::default(),
        )
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pool_without_target_is_unavailable() {
        let response = get(front_door().router(), "/cluster1").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["pool"], "cluster1");
    }

    #[tokio::test]
    async fn test_unknown_routes_are_not_found() {
        let door = front_door();
        assert_eq!(get(door.router(), "/cluster9").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(door.router(), "/").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(door.router(), "/cluster1/extra").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_backend_body_relayed_unchanged() {
        use crate::load_balancer::member::Member;
        use crate::load_balancer::pool::{CycleSummary, SelectedTarget};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        const BODY: &str = r#"{"z":1,"a":2,"big":123456789012345678901234567890}"#;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    BODY.len(),
                    BODY
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let member = Member::from_address(&addr.to_string(), 8000, "/c").unwrap();
        let pool = Arc::new(Pool::new(&PoolConfig::new("c"), vec![member.clone()]));
        pool.publish(
            Some(SelectedTarget { member, latency: std::time::Duration::from_millis(1) }),
            CycleSummary { probed: 1, healthy: 1 },
        );
        let door = FrontDoor::new(
            Arc::new(PoolManager::new([pool])),
            Forwarder::new(&ForwardConfig::default()),
            &ListenerConfig::default(),
        );

        let response = get(door.router(), "/c").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_request_id_is_preserved() {
        let response = front_door()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/cluster1")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
