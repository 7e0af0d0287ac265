//! Pool state management.
//!
//! # Responsibilities
//! - Hold each pool's member list and its published selected target
//! - Publish selections atomically so readers see a complete value
//! - Look pools up by name for the Front Door and admin API

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::config::PoolConfig;
use crate::load_balancer::member::Member;

/// The fastest healthy member found by the most recent cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTarget {
    pub member: Member,
    pub latency: Duration,
}

/// Counts from the most recently completed selection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub probed: usize,
    pub healthy: usize,
}

/// A named group of interchangeable members.
#[derive(Debug)]
pub struct Pool {
    name: String,
    tag: String,
    port: u16,
    path: String,
    members: ArcSwap<Vec<Member>>,
    selected: ArcSwapOption<SelectedTarget>,
    last_cycle: ArcSwapOption<CycleSummary>,
}

impl Pool {
    pub fn new(config: &PoolConfig, members: Vec<Member>) -> Self {
        Self {
            name: config.name.clone(),
            tag: config.tag_value().to_string(),
            port: config.port,
            path: config.forward_path(),
            members: ArcSwap::from_pointee(members),
            selected: ArcSwapOption::empty(),
            last_cycle: ArcSwapOption::empty(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inventory tag value for this pool.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Port applied to inventory addresses that have none.
    pub fn default_port(&self) -> u16 {
        self.port
    }

    /// Forward path attached to every member.
    pub fn forward_path(&self) -> &str {
        &self.path
    }

    /// Snapshot of the current member list.
    pub fn members(&self) -> Arc<Vec<Member>> {
        self.members.load_full()
    }

    /// Replace the member list wholesale.
    pub fn replace_members(&self, members: Vec<Member>) {
        self.members.store(Arc::new(members));
    }

    /// Latest published selection, if any.
    pub fn selected(&self) -> Option<Arc<SelectedTarget>> {
        self.selected.load_full()
    }

    /// Publish the outcome of a cycle. `None` clears the selection.
    pub fn publish(&self, target: Option<SelectedTarget>, summary: CycleSummary) {
        self.selected.store(target.map(Arc::new));
        self.last_cycle.store(Some(Arc::new(summary)));
    }

    pub fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle.load().as_deref().copied()
    }
}

/// All pools, keyed by name. Fixed after startup.
#[derive(Debug, Default)]
pub struct PoolManager {
    pools: HashMap<String, Arc<Pool>>,
}

impl PoolManager {
    pub fn new(pools: impl IntoIterator<Item = Arc<Pool>>) -> Self {
        Self {
            pools: pools
                .into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Pool>> {
        self.pools.get(name)
    }

    /// Pools sorted by name.
    pub fn all(&self) -> Vec<Arc<Pool>> {
        let mut pools: Vec<_> = self.pools.values().cloned().collect();
        pools.sort_by(|a, b| a.name().cmp(b.name()));
        pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
