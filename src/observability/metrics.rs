//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by pool, status
//! - `router_request_duration_seconds` (histogram): Front Door latency
//! - `router_probe_total` (counter): probes by pool, outcome
//! - `router_probe_latency_seconds` (histogram): successful probe latency
//! - `router_selected_latency_seconds` (gauge): latency of the current target
//! - `router_pool_healthy` (gauge): 1 while the pool has a target
//! - `router_inventory_members` (gauge): members resolved per pool

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(pool: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "router_requests_total",
        "pool" => pool.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("router_request_duration_seconds", "pool" => pool.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_probe(pool: &str, outcome: &'static str, latency: Option<Duration>) {
    ::metrics::counter!("router_probe_total", "pool" => pool.to_string(), "outcome" => outcome)
        .increment(1);
    if let Some(latency) = latency {
        ::metrics::histogram!("router_probe_latency_seconds", "pool" => pool.to_string())
            .record(latency.as_secs_f64());
    }
}

pub fn record_selection(pool: &str, latency: Option<Duration>) {
    let healthy = if latency.is_some() { 1.0 } else { 0.0 };
    ::metrics::gauge!("router_pool_healthy", "pool" => pool.to_string()).set(healthy);
    if let Some(latency) = latency {
        ::metrics::gauge!("router_selected_latency_seconds", "pool" => pool.to_string())
            .set(latency.as_secs_f64());
    }
}

pub fn record_members(pool: &str, count: usize) {
    ::metrics::gauge!("router_inventory_members", "pool" => pool.to_string()).set(count as f64);
}
