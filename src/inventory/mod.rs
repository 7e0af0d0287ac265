//! Pool membership discovery.
//!
//! # Data Flow
//! ```text
//! Startup, per pool:
//!     resolver.rs (tag + state filter, follow next_token, retry transient errors)
//!     → source.rs (InventorySource trait)
//!         - static_source.rs (instances from the config file)
//!         - http_source.rs (remote paginated JSON API)
//!     → Vec<Member> handed to the Pool
//!
//! Optional, per pool (refresh_interval_ms > 0):
//!     refresher.rs re-runs the resolver and swaps the member list
//! ```
//!
//! # Design Decisions
//! - Membership lists are replaced wholesale, never patched
//! - An empty result is a valid, empty pool
//! - Inventory failure at startup aborts that pool only

pub mod http_source;
pub mod refresher;
pub mod resolver;
pub mod source;
pub mod static_source;

use std::sync::Arc;

use crate::config::{InventoryConfig, InventoryKind};

pub use http_source::HttpInventory;
pub use refresher::{MembershipRefresher, RefreshOutcome};
pub use resolver::MembershipResolver;
pub use source::{InventoryError, InventoryPage, InventoryQuery, InventorySource};
pub use static_source::StaticInventory;

/// Build the inventory source selected by `config.kind`.
pub fn build_source(config: &InventoryConfig) -> Result<Arc<dyn InventorySource>, InventoryError> {
    let source: Arc<dyn InventorySource> = match config.kind {
        InventoryKind::Static => Arc::new(StaticInventory::new(config.instances.clone())),
        InventoryKind::Http => Arc::new(HttpInventory::new(config)?),
    };
    Ok(source)
}
