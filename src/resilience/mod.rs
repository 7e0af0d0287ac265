//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inventory page request:
//!     → retries.rs (retry transient failures up to max_attempts)
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Every external call has its own deadline; retries wrap the deadline
//! - Probes and forwards are never retried: the next cycle is the retry
//! - Jittered backoff avoids synchronized retries across pools

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
