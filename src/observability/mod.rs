//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty or compact)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (pool, member, error) on every event
//! - Request ID flows from the Front Door into forward logs
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
