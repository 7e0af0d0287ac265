//! Periodic membership re-resolution.
//!
//! Off unless `inventory.refresh_interval_ms` is set; without it members
//! added to the inventory after startup stay invisible until restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::inventory::resolver::MembershipResolver;
use crate::load_balancer::pool::Pool;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The member list was replaced; holds the new size.
    Updated(usize),
    Unchanged,
    /// Resolution failed; the previous list was kept.
    Failed,
    /// A refresh for this pool was already running.
    Skipped,
}

/// Re-resolves one pool's members on a fixed cadence.
pub struct MembershipRefresher {
    resolver: MembershipResolver,
    pool: Arc<Pool>,
    lock: Mutex<()>,
}

impl MembershipRefresher {
    pub fn new(resolver: MembershipResolver, pool: Arc<Pool>) -> Self {
        Self {
            resolver,
            pool,
            lock: Mutex::new(()),
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.lock.try_lock() else {
            return RefreshOutcome::Skipped;
        };

        match self.resolver.resolve(&self.pool).await {
            Ok(members) if members == *self.pool.members() => RefreshOutcome::Unchanged,
            Ok(members) => {
                let count = members.len();
                tracing::info!(
                    pool = %self.pool.name(),
                    previous = self.pool.members().len(),
                    current = count,
                    "Pool membership changed"
                );
                self.pool.replace_members(members);
                metrics::record_members(self.pool.name(), count);
                RefreshOutcome::Updated(count)
            }
            Err(e) => {
                tracing::warn!(pool = %self.pool.name(), error = %e, "Membership refresh failed, keeping previous members");
                RefreshOutcome::Failed
            }
        }
    }

    /// Refresh every `interval` until shutdown. The first refresh happens one
    /// interval after start, since startup already resolved the pool.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(pool = %self.pool.name(), "Membership refresher received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>, interval: Duration, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(interval, shutdown))
    }
}
