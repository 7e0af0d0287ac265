//! Inventory query contract.

use async_trait::async_trait;

/// One page request against the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryQuery {
    /// Tag key naming the pool (e.g. "Cluster").
    pub tag_key: String,
    /// Tag value the members must carry.
    pub tag_value: String,
    /// Administrative state the members must be in (e.g. "running").
    pub state: String,
    /// Cursor returned by the previous page, `None` for the first page.
    pub next_token: Option<String>,
    pub page_size: usize,
}

/// One page of matching addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryPage {
    pub addresses: Vec<String>,
    /// `None` once the last page has been returned.
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory unreachable: {0}")]
    Unreachable(String),

    #[error("inventory returned status {0}")]
    BadStatus(u16),

    #[error("malformed inventory response: {0}")]
    Malformed(String),
}

impl InventoryError {
    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            InventoryError::Unreachable(_) => true,
            InventoryError::BadStatus(status) => *status == 429 || *status >= 500,
            InventoryError::Malformed(_) => false,
        }
    }
}

/// Something that can enumerate the members of a tagged pool.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn describe(&self, query: &InventoryQuery) -> Result<InventoryPage, InventoryError>;
}
