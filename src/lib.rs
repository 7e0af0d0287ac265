//! Latency-aware HTTP router library

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod inventory;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::RouterConfig;
pub use http::FrontDoor;
pub use lifecycle::{App, Shutdown, StartupError};
