//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Every long-running task (selectors, refreshers, listeners) subscribes
/// to the same broadcast channel.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for `tasks` to finish, abandoning any still running after `deadline`.
pub async fn drain(tasks: Vec<JoinHandle<()>>, deadline: Duration) {
    let count = tasks.len();
    let aborts: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();

    match tokio::time::timeout(deadline, futures_util::future::join_all(tasks)).await {
        Ok(_) => tracing::debug!(tasks = count, "Background tasks stopped"),
        Err(_) => {
            tracing::warn!(tasks = count, deadline_ms = deadline.as_millis() as u64, "Drain deadline reached, aborting remaining tasks");
            for handle in aborts {
                handle.abort();
            }
        }
    }
}
