//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Pool selector cycle
//!     → probe.rs (Prober trait, ProbeResult)
//!     → active.rs (HTTP GET to the member's health path, bounded by timeout)
//!     → latency on 2xx, classified failure otherwise
//! ```
//!
//! # Design Decisions
//! - Probes are pure input/output; the selector owns all state
//! - Every probe has a deadline so one hung member cannot stall a cycle
//! - Failed members are retried every cycle (no permanent exclusion)

pub mod active;
pub mod probe;

pub use active::HttpProber;
pub use probe::{ProbeError, ProbeResult, Prober};
