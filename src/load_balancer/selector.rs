//! Latency-based target selection.
//!
//! # Responsibilities
//! - Probe every member of a pool once per cycle
//! - Publish the fastest healthy member as the pool's target
//! - Guarantee at most one in-flight cycle per pool
//!
//! # Design Decisions
//! - Cycles are entered through `try_lock`; a busy pool skips, never queues
//! - The background loop runs cycles inline on a `Skip` interval, so ticks
//!   missed during a slow cycle are dropped instead of bursting afterwards
//! - Ties keep the first member in list order

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::health::probe::{ProbeResult, Prober};
use crate::load_balancer::member::Member;
use crate::load_balancer::pool::{CycleSummary, Pool, SelectedTarget};
use crate::observability::metrics;

/// What happened when a cycle was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran and published this selection.
    Completed(Option<SelectedTarget>),
    /// Another cycle for the same pool was still in flight.
    Skipped,
}

/// Pick the member with strictly minimal latency among successful probes.
///
/// `results` must be in the same order as `members`.
pub fn select_fastest<'a, I>(members: &[Member], results: I) -> Option<SelectedTarget>
where
    I: IntoIterator<Item = &'a ProbeResult>,
{
    let mut best: Option<(usize, Duration)> = None;
    for (index, result) in results.into_iter().enumerate().take(members.len()) {
        if let Ok(latency) = result {
            match best {
                Some((_, fastest)) if *latency >= fastest => {}
                _ => best = Some((index, *latency)),
            }
        }
    }

    best.map(|(index, latency)| SelectedTarget {
        member: members[index].clone(),
        latency,
    })
}

/// Keeps one pool's selected target fresh.
pub struct PoolSelector {
    pool: Arc<Pool>,
    prober: Arc<dyn Prober>,
    concurrent: bool,
    cycle_lock: Mutex<()>,
}

impl PoolSelector {
    pub fn new(pool: Arc<Pool>, prober: Arc<dyn Prober>, concurrent: bool) -> Self {
        Self {
            pool,
            prober,
            concurrent,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Run one probing pass and publish its result.
    ///
    /// Returns [`CycleOutcome::Skipped`] without probing if a pass for this
    /// pool is already running.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            tracing::debug!(pool = %self.pool.name(), "Selection cycle still in flight, skipping");
            return CycleOutcome::Skipped;
        };

        let members = self.pool.members();
        let results = self.probe_all(&members).await;

        let mut healthy = 0;
        for (member, result) in members.iter().zip(&results) {
            match result {
                Ok(latency) => {
                    healthy += 1;
                    metrics::record_probe(self.pool.name(), "success", Some(*latency));
                }
                Err(e) => {
                    tracing::warn!(pool = %self.pool.name(), member = %member, error = %e, "Probe failed");
                    metrics::record_probe(self.pool.name(), e.kind(), None);
                }
            }
        }

        let target = select_fastest(&members, &results);
        let summary = CycleSummary {
            probed: members.len(),
            healthy,
        };

        let previous = self.pool.selected();
        let changed = previous.as_ref().map(|p| &p.member) != target.as_ref().map(|t| &t.member);
        match (&target, changed) {
            (Some(t), true) => tracing::info!(
                pool = %self.pool.name(),
                member = %t.member,
                latency_ms = t.latency.as_secs_f64() * 1000.0,
                healthy,
                "Selected new target"
            ),
            (None, true) => tracing::warn!(
                pool = %self.pool.name(),
                probed = summary.probed,
                "No healthy member, clearing target"
            ),
            (Some(t), false) => tracing::debug!(
                pool = %self.pool.name(),
                member = %t.member,
                latency_ms = t.latency.as_secs_f64() * 1000.0,
                "Target unchanged"
            ),
            (None, false) => tracing::debug!(pool = %self.pool.name(), "Still no healthy member"),
        }

        metrics::record_selection(self.pool.name(), target.as_ref().map(|t| t.latency));
        self.pool.publish(target.clone(), summary);
        CycleOutcome::Completed(target)
    }

    async fn probe_all(&self, members: &[Member]) -> Vec<ProbeResult> {
        if self.concurrent {
            join_all(members.iter().map(|m| self.prober.probe(m))).await
        } else {
            let mut results = Vec::with_capacity(members.len());
            for member in members {
                results.push(self.prober.probe(member).await);
            }
            results
        }
    }

    /// Run cycles on `interval` until shutdown.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            pool = %self.pool.name(),
            members = self.pool.members().len(),
            interval_ms = interval.as_millis() as u64,
            "Pool selector starting"
        );

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(pool = %self.pool.name(), "Pool selector received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Spawn [`PoolSelector::run`] on the runtime.
    pub fn spawn(self: Arc<Self>, interval: Duration, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(interval, shutdown))
    }
}
