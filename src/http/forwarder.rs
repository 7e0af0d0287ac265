//! Request forwarding to a pool's selected target.
//!
//! # Responsibilities
//! - Issue the equivalent `GET` to the target's pool-scoped path
//! - Buffer the full backend body under a deadline and size cap
//! - Check it is JSON and hand the original bytes back unchanged
//! - Classify every failure so the Front Door can answer promptly

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::ForwardConfig;
use crate::http::request::X_REQUEST_ID;
use crate::load_balancer::pool::SelectedTarget;

/// Why a forward did not produce a JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("no healthy target available")]
    NoHealthyTarget,

    #[error("backend connection failed: {0}")]
    Connection(String),

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("backend returned status {0}")]
    BadStatus(StatusCode),

    #[error("backend returned malformed content: {0}")]
    Malformed(String),

    #[error("could not build backend request: {0}")]
    Request(String),
}

impl ForwardError {
    /// Status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::NoHealthyTarget => StatusCode::SERVICE_UNAVAILABLE,
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Relays requests to backends over a pooled HTTP client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(config: &ForwardConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeout()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: config.timeout(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Forward to `target` and return the backend's JSON body as received.
    ///
    /// The whole exchange, body included, is bounded by the forward timeout.
    /// The body is checked for well-formed JSON but never re-encoded, so key
    /// order and number precision survive.
    pub async fn forward(
        &self,
        target: Option<&SelectedTarget>,
        query: Option<&str>,
        request_id: Option<&str>,
    ) -> Result<Bytes, ForwardError> {
        let target = target.ok_or(ForwardError::NoHealthyTarget)?;

        let mut builder = Request::builder()
            .method("GET")
            .uri(target.member.forward_url(query))
            .header(header::ACCEPT, "application/json");
        if let Some(id) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            builder = builder.header(X_REQUEST_ID, id);
        }
        let request = builder
            .body(Body::empty())
            .map_err(|e| ForwardError::Request(e.to_string()))?;

        match time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, request: Request<Body>) -> Result<Bytes, ForwardError> {
        let response: hyper::Response<hyper::body::Incoming> = self
            .client
            .request(request)
            .await
            .map_err(|e| ForwardError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::BadStatus(status));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes)
            .await
            .map_err(|e| ForwardError::Malformed(format!("body read failed: {}", e)))?;

        serde_json::from_slice::<serde::de::IgnoredAny>(&bytes)
            .map_err(|e| ForwardError::Malformed(e.to_string()))?;
        Ok(bytes)
    }
}
