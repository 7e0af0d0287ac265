//! Membership resolution.
//!
//! # Responsibilities
//! - Query the inventory for a pool's tagged, running instances
//! - Follow pagination tokens until the source reports the end
//! - Turn addresses into members, dropping duplicates and bad records

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::InventoryConfig;
use crate::inventory::source::{InventoryError, InventoryQuery, InventorySource};
use crate::load_balancer::member::Member;
use crate::load_balancer::pool::Pool;
use crate::resilience::RetryPolicy;

/// Resolves pool membership from an [`InventorySource`].
#[derive(Clone)]
pub struct MembershipResolver {
    source: Arc<dyn InventorySource>,
    tag_key: String,
    state: String,
    page_size: usize,
    retry: RetryPolicy,
}

impl MembershipResolver {
    pub fn new(source: Arc<dyn InventorySource>, config: &InventoryConfig) -> Self {
        Self {
            source,
            tag_key: config.tag_key.clone(),
            state: config.state.clone(),
            page_size: config.page_size.max(1),
            retry: RetryPolicy::from_inventory(config),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// All addresses tagged `tag_value`, accumulated across pages.
    ///
    /// An empty inventory yields an empty list. Any page that still fails
    /// after retries fails the whole resolution.
    pub async fn resolve_addresses(&self, tag_value: &str) -> Result<Vec<String>, InventoryError> {
        let mut addresses = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut query = InventoryQuery {
            tag_key: self.tag_key.clone(),
            tag_value: tag_value.to_string(),
            state: self.state.clone(),
            next_token: None,
            page_size: self.page_size,
        };

        loop {
            let page = self
                .retry
                .retry("inventory page", InventoryError::is_transient, || {
                    self.source.describe(&query)
                })
                .await?;

            tracing::debug!(
                tag = %tag_value,
                page_len = page.addresses.len(),
                more = page.next_token.is_some(),
                "Inventory page received"
            );
            addresses.extend(page.addresses);

            match page.next_token {
                None => break,
                Some(token) => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(InventoryError::Malformed(format!(
                            "pagination token {:?} repeated",
                            token
                        )));
                    }
                    query.next_token = Some(token);
                }
            }
        }

        Ok(addresses)
    }

    /// Resolve the members of `pool` without modifying it.
    pub async fn resolve(&self, pool: &Pool) -> Result<Vec<Member>, InventoryError> {
        let addresses = self.resolve_addresses(pool.tag()).await?;

        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(addresses.len());
        for address in addresses {
            match Member::from_address(&address, pool.default_port(), pool.forward_path()) {
                Ok(member) => {
                    if seen.insert(member.clone()) {
                        members.push(member);
                    }
                }
                Err(e) => {
                    tracing::warn!(pool = %pool.name(), error = %e, "Skipping inventory record");
                }
            }
        }

        Ok(members)
    }
}
