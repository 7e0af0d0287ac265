//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → server.rs (Axum setup, `GET /<pool>` dispatch)
//!     → request.rs (request ID assigned and propagated)
//!     → pool's latest SelectedTarget (lock-free read)
//!     → forwarder.rs (bounded backend GET, JSON body buffered)
//!     → response.rs (failures mapped to 404/502/503/504)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardError, Forwarder};
pub use request::X_REQUEST_ID;
pub use server::{AppState, FrontDoor};
