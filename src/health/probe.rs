//! Probe contract shared by the selector and its probers.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::load_balancer::member::Member;

/// Why a probe failed.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unhealthy status {0}")]
    BadStatus(StatusCode),

    #[error("could not build probe request: {0}")]
    Request(String),
}

impl ProbeError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout(_) => "timeout",
            ProbeError::Connection(_) => "connection",
            ProbeError::BadStatus(_) => "bad_status",
            ProbeError::Request(_) => "request",
        }
    }
}

/// Outcome of one probe: observed latency on success.
pub type ProbeResult = Result<Duration, ProbeError>;

/// Bounded-time liveness check against a single member.
///
/// Implementations must not touch shared pool state.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, member: &Member) -> ProbeResult;
}
