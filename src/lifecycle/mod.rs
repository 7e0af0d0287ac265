//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Inventory (per pool) → Admin → Selectors + refreshers → Front Door
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Front Door drains → Loops exit → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Traffic is accepted only after every pool has been resolved
//! - A pool whose inventory fails is served empty (503); all pools failing is fatal
//! - Background loops get a bounded drain window on shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{App, StartupError};
