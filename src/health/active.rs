//! Active HTTP health probing.
//!
//! # Responsibilities
//! - Issue a `GET` to a member's health path
//! - Enforce the probe deadline
//! - Report latency on 2xx, a classified failure otherwise

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::ProbeConfig;
use crate::health::probe::{ProbeError, ProbeResult, Prober};
use crate::load_balancer::member::Member;

const USER_AGENT: &str = "latency-router-health-check";

/// Probes members over plain HTTP.
#[derive(Clone)]
pub struct HttpProber {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeout()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            path: config.path.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, member: &Member) -> ProbeResult {
        let request = Request::builder()
            .method("GET")
            .uri(member.probe_url(&self.path))
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let start = Instant::now();
        let response = match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProbeError::Connection(e.to_string())),
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };
        let elapsed = start.elapsed();

        let status = response.status();
        if status.is_success() {
            Ok(elapsed)
        } else {
            Err(ProbeError::BadStatus(status))
        }
    }
}
