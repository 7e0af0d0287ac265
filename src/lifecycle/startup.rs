//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve every configured pool from the inventory
//! - Start one selector per pool (and a refresher when enabled)
//! - Bring up the admin API, then the Front Door
//! - Tear everything down in reverse on shutdown
//!
//! # Design Decisions
//! - Logging and metrics are installed by the binary before [`App::bootstrap`]
//! - Pools resolve sequentially, in configuration order
//! - Listeners start last (traffic only once pools exist)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::{run_admin, AdminState};
use crate::config::{ConfigError, RouterConfig};
use crate::health::{HttpProber, Prober};
use crate::http::{Forwarder, FrontDoor};
use crate::inventory::{build_source, InventoryError, MembershipRefresher, MembershipResolver};
use crate::lifecycle::shutdown::{drain, Shutdown};
use crate::load_balancer::{Pool, PoolManager, PoolSelector};
use crate::observability::metrics;

/// How long background loops get to exit after the Front Door stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("inventory source unavailable: {0}")]
    Source(InventoryError),

    #[error("every pool failed to resolve; refusing to start")]
    NoPools,

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A resolved, ready-to-serve router.
pub struct App {
    config: RouterConfig,
    pools: Arc<PoolManager>,
    resolver: MembershipResolver,
}

impl App {
    /// Resolve every pool's members.
    ///
    /// A pool whose resolution fails is logged and kept with no members, so
    /// its route answers 503 like any pool without a target (a refresher, if
    /// enabled, can still fill it later). If every pool fails the router
    /// refuses to start.
    pub async fn bootstrap(config: RouterConfig) -> Result<Self, StartupError> {
        let source = build_source(&config.inventory).map_err(StartupError::Source)?;
        let resolver = MembershipResolver::new(source, &config.inventory);

        if config.probe.timeout() > config.probe.interval() {
            tracing::warn!(
                timeout_ms = config.probe.timeout_ms,
                interval_ms = config.probe.interval_ms,
                "Probe timeout exceeds probe interval; slow cycles will skip ticks"
            );
        }

        let mut pools = Vec::with_capacity(config.pools.len());
        let mut resolved = 0;
        for pool_config in &config.pools {
            let pool = Pool::new(pool_config, Vec::new());
            match resolver.resolve(&pool).await {
                Ok(members) => {
                    tracing::info!(
                        pool = %pool.name(),
                        tag = %pool.tag(),
                        members = members.len(),
                        "Pool resolved"
                    );
                    if members.is_empty() {
                        tracing::warn!(pool = %pool.name(), "Pool has no members; requests will get 503");
                    }
                    metrics::record_members(pool.name(), members.len());
                    pool.replace_members(members);
                    resolved += 1;
                }
                Err(e) => {
                    tracing::error!(pool = %pool.name(), error = %e, "Pool resolution failed, serving it without members");
                    metrics::record_members(pool.name(), 0);
                }
            }
            pools.push(Arc::new(pool));
        }

        if resolved == 0 {
            return Err(StartupError::NoPools);
        }

        Ok(Self {
            config,
            pools: Arc::new(PoolManager::new(pools)),
            resolver,
        })
    }

    pub fn pools(&self) -> &Arc<PoolManager> {
        &self.pools
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Start selectors and refreshers for every pool.
    fn spawn_background(&self, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(&self.config.probe));
        let mut tasks = Vec::new();

        for pool in self.pools.all() {
            let selector = Arc::new(PoolSelector::new(
                pool.clone(),
                prober.clone(),
                self.config.probe.concurrent,
            ));
            tasks.push(selector.spawn(self.config.probe.interval(), shutdown.subscribe()));

            if let Some(interval) = self.config.inventory.refresh_interval() {
                let refresher = Arc::new(MembershipRefresher::new(self.resolver.clone(), pool));
                tasks.push(refresher.spawn(interval, shutdown.subscribe()));
            }
        }

        tasks
    }

    async fn spawn_admin(&self, shutdown: &Shutdown) -> Result<Option<JoinHandle<()>>, StartupError> {
        let admin = &self.config.admin;
        if !admin.enabled {
            return Ok(None);
        }

        let listener = bind(&admin.bind_address).await?;
        let state = AdminState::new(self.pools.clone(), &admin.api_key);
        let rx = shutdown.subscribe();
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = run_admin(listener, state, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        })))
    }

    /// Run until `shutdown` fires, serving the Front Door on `listener`.
    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        let admin = self.spawn_admin(&shutdown).await?;
        let mut tasks = self.spawn_background(&shutdown);
        tasks.extend(admin);

        let front_door = FrontDoor::new(
            self.pools.clone(),
            Forwarder::new(&self.config.forward),
            &self.config.listener,
        );
        let result = front_door.run(listener, shutdown.subscribe()).await;

        // The Front Door can also stop on its own error; make sure the loops follow.
        shutdown.trigger();
        drain(tasks, DRAIN_TIMEOUT).await;

        tracing::info!("Shutdown complete");
        result.map_err(StartupError::from)
    }
}

/// Bind a TCP listener, keeping the address in the error.
pub async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    let parsed: Result<SocketAddr, _> = address.parse();
    let result = match parsed {
        Ok(addr) => TcpListener::bind(addr).await,
        Err(_) => TcpListener::bind(address).await,
    };
    result.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InstanceConfig, PoolConfig};

    fn config(pools: &[&str], instances: Vec<InstanceConfig>) -> RouterConfig {
        let mut config = RouterConfig::default();
        config.pools = pools.iter().map(|p| PoolConfig::new(*p)).collect();
        config.inventory.instances = instances;
        config
    }

    #[tokio::test]
    async fn test_bootstrap_resolves_each_pool() {
        let app = App::bootstrap(config(
            &["cluster1", "cluster2"],
            vec![
                InstanceConfig::tagged("10.0.0.1", "Cluster", "cluster1"),
                InstanceConfig::tagged("10.0.0.2", "Cluster", "cluster2"),
                InstanceConfig::tagged("10.0.0.3", "Cluster", "cluster2"),
            ],
        ))
        .await
        .unwrap();

        assert_eq!(app.pools().len(), 2);
        assert_eq!(app.pools().get("cluster1").unwrap().members().len(), 1);
        assert_eq!(app.pools().get("cluster2").unwrap().members().len(), 2);
        assert!(app.pools().get("cluster2").unwrap().selected().is_none());
    }

    #[tokio::test]
    async fn test_empty_pool_still_starts() {
        let app = App::bootstrap(config(&["cluster1"], vec![])).await.unwrap();
        assert!(app.pools().get("cluster1").unwrap().members().is_empty());
    }

    #[tokio::test]
    async fn test_failed_inventory_refuses_to_start() {
        let mut config = config(&["cluster1"], vec![]);
        config.inventory.kind = crate::config::InventoryKind::Http;
        config.inventory.endpoint = Some("http://127.0.0.1:1".into());
        config.inventory.max_attempts = 1;

        let err = App::bootstrap(config).await.err().unwrap();
        assert!(matches!(err, StartupError::NoPools));
    }

    #[tokio::test]
    async fn test_unresolved_pool_answers_unavailable() {
        use axum::{body::Body, extract::Query, http::Request, http::StatusCode, routing::get, Json};
        use std::collections::HashMap;
        use tower::ServiceExt;

        // Inventory that only knows cluster1 and fails for anything else.
        let inventory = axum::Router::new().route(
            "/instances",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("tag_value").map(String::as_str) {
                    Some("cluster1") => Ok(Json(serde_json::json!({ "addresses": ["10.0.0.1"], "next_token": null }))),
                    _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, inventory).await.unwrap();
        });

        let mut config = config(&["cluster1", "cluster2"], vec![]);
        config.inventory.kind = crate::config::InventoryKind::Http;
        config.inventory.endpoint = Some(format!("http://{}", addr));
        config.inventory.max_attempts = 1;

        let app = App::bootstrap(config).await.unwrap();
        assert_eq!(app.pools().len(), 2);
        assert_eq!(app.pools().get("cluster1").unwrap().members().len(), 1);
        assert!(app.pools().get("cluster2").unwrap().members().is_empty());

        let door = FrontDoor::new(
            app.pools().clone(),
            Forwarder::new(&app.config().forward),
            &app.config().listener,
        );
        let response = door
            .router()
            .oneshot(Request::builder().uri("/cluster2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["pool"], "cluster2");
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap().to_string();
        match bind(&address).await {
            Err(StartupError::Bind { address: a, .. }) => assert_eq!(a, address),
            other => panic!("expected bind error, got {:?}", other.map(|_| ())),
        }
    }
}
