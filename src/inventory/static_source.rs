//! Inventory backed by instances declared in the config file.

use async_trait::async_trait;

use crate::config::InstanceConfig;
use crate::inventory::source::{InventoryError, InventoryPage, InventoryQuery, InventorySource};

/// Serves configured instances with the same filtering and paging an
/// external inventory would apply.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    instances: Vec<InstanceConfig>,
}

impl StaticInventory {
    pub fn new(instances: Vec<InstanceConfig>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl InventorySource for StaticInventory {
    async fn describe(&self, query: &InventoryQuery) -> Result<InventoryPage, InventoryError> {
        let offset = match query.next_token.as_deref() {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| InventoryError::Malformed(format!("unknown page token {:?}", token)))?,
        };

        let matching: Vec<&InstanceConfig> = self
            .instances
            .iter()
            .filter(|i| i.state.eq_ignore_ascii_case(&query.state))
            .filter(|i| i.tags.get(&query.tag_key) == Some(&query.tag_value))
            .collect();

        let page_size = query.page_size.max(1);
        let end = (offset + page_size).min(matching.len());
        let addresses = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|i| i.address.clone())
            .collect();

        Ok(InventoryPage {
            addresses,
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }
}
