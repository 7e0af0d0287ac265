//! Remote inventory API client.
//!
//! Speaks a small paginated JSON protocol:
//!
//! ```text
//! GET <endpoint>/instances?tag_key=Cluster&tag_value=cluster1&state=running&page_size=100[&next_token=..]
//! → {"addresses": ["10.0.0.1", "10.0.0.2:8000"], "next_token": "abc" | null}
//! ```

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::InventoryConfig;
use crate::inventory::source::{InventoryError, InventoryPage, InventoryQuery, InventorySource};

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    addresses: Vec<String>,
    #[serde(default)]
    next_token: Option<String>,
}

/// Inventory reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventory {
    client: reqwest::Client,
    instances_url: String,
}

impl HttpInventory {
    pub fn new(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| InventoryError::Unreachable("no inventory endpoint configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .no_proxy()
            .build()
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            instances_url: format!("{}/instances", endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl InventorySource for HttpInventory {
    async fn describe(&self, query: &InventoryQuery) -> Result<InventoryPage, InventoryError> {
        let page_size = query.page_size.to_string();
        let mut params = vec![
            ("tag_key", query.tag_key.as_str()),
            ("tag_value", query.tag_value.as_str()),
            ("state", query.state.as_str()),
            ("page_size", page_size.as_str()),
        ];
        if let Some(token) = query.next_token.as_deref() {
            params.push(("next_token", token));
        }

        let response = self
            .client
            .get(&self.instances_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::BadStatus(status.as_u16()));
        }

        let body: PageBody = response
            .json()
            .await
            .map_err(|e| InventoryError::Malformed(e.to_string()))?;

        Ok(InventoryPage {
            addresses: body.addresses,
            next_token: body.next_token.filter(|t| !t.is_empty()),
        })
    }
}
