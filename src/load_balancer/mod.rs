//! Latency-based load balancing.
//!
//! # Data Flow
//! ```text
//! Startup: resolved members → pool.rs (Pool per configured name)
//!
//! Every probe interval, per pool:
//!     selector.rs (enter cycle, or skip if one is in flight)
//!     → health::Prober for each member
//!     → select_fastest (strict minimum, ties keep list order)
//!     → Pool::publish (single atomic swap)
//!
//! Front Door request:
//!     → Pool::selected (lock-free read of the last published target)
//! ```
//!
//! # Design Decisions
//! - Readers never block on, or trigger, a probe cycle
//! - A cycle with no healthy member publishes "no target"
//! - Pools are independent; one slow pool never delays another

pub mod member;
pub mod pool;
pub mod selector;

pub use member::Member;
pub use pool::{CycleSummary, Pool, PoolManager, SelectedTarget};
pub use selector::{select_fastest, CycleOutcome, PoolSelector};
