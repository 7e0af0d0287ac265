//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use latency_router::config::{InstanceConfig, PoolConfig, RouterConfig};
use latency_router::load_balancer::PoolManager;
use latency_router::{App, Shutdown};

/// Start a mock backend whose reply is computed from the request path.
///
/// Binds an ephemeral port on 127.0.0.1 and returns its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = f(path).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// How a mock member answers one kind of request.
#[derive(Clone, Copy)]
pub struct Reply {
    pub status: u16,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(delay_ms: u64) -> Self {
        Self { status: 200, delay: Duration::from_millis(delay_ms) }
    }

    pub fn status(status: u16) -> Self {
        Self { status, delay: Duration::ZERO }
    }
}

/// A mock pool member: health probes hit `/`, forwards hit anything else.
pub struct MockMember {
    pub addr: SocketAddr,
    pub probes: Arc<AtomicUsize>,
    pub forwards: Arc<AtomicUsize>,
}

impl MockMember {
    pub async fn start(id: &'static str, health: Reply, forward: Reply) -> Self {
        let probes = Arc::new(AtomicUsize::new(0));
        let forwards = Arc::new(AtomicUsize::new(0));
        let (p, fw) = (probes.clone(), forwards.clone());

        let addr = start_programmable_backend(move |path| {
            let (p, fw) = (p.clone(), fw.clone());
            async move {
                let reply = if path == "/" {
                    p.fetch_add(1, Ordering::SeqCst);
                    health
                } else {
                    fw.fetch_add(1, Ordering::SeqCst);
                    forward
                };
                tokio::time::sleep(reply.delay).await;
                let body = format!(r#"{{"message":"Instance {} has received the request"}}"#, id);
                (reply.status, body)
            }
        })
        .await;

        Self { addr, probes, forwards }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn instance(&self, pool: &str) -> InstanceConfig {
        InstanceConfig::tagged(self.addr.to_string(), "Cluster", pool)
    }
}

/// A config with the given pools and a static inventory.
pub fn router_config(pools: &[&str], instances: Vec<InstanceConfig>) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.pools = pools.iter().map(|p| PoolConfig::new(*p)).collect();
    config.inventory.instances = instances;
    config.probe.interval_ms = 100;
    config.probe.timeout_ms = 1_000;
    config.forward.timeout_ms = 1_000;
    config
}

pub struct RunningRouter {
    pub addr: SocketAddr,
    pub pools: Arc<PoolManager>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl RunningRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("router did not stop")
            .unwrap();
    }
}

/// Bootstrap and serve a router on an ephemeral port.
pub async fn start_router(config: RouterConfig) -> RunningRouter {
    let app = App::bootstrap(config).await.expect("bootstrap failed");
    let pools = app.pools().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let serve_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        app.serve(listener, serve_shutdown).await.unwrap();
    });

    RunningRouter { addr, pools, shutdown, handle }
}

/// Poll `condition` every 20ms until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
