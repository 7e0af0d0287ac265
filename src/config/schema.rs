//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the latency router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Front Door listener (host, port, request deadline).
    pub listener: ListenerConfig,

    /// Pools exposed as `GET /<name>`.
    pub pools: Vec<PoolConfig>,

    /// Health probing cadence and deadline.
    pub probe: ProbeConfig,

    /// Backend forwarding limits.
    pub forward: ForwardConfig,

    /// Where pool membership comes from.
    pub inventory: InventoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g. "0.0.0.0").
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Outer deadline for a single inbound request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl ListenerConfig {
    /// `host:port`, with IPv6 hosts bracketed.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_ms: 10_000,
        }
    }
}

/// A named pool of interchangeable backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Pool name, also the public route segment.
    pub name: String,

    /// Inventory tag value identifying members. Defaults to `name`.
    #[serde(default)]
    pub tag: Option<String>,

    /// Port used when an inventory address carries none.
    #[serde(default = "default_member_port")]
    pub port: u16,

    /// Path requested on members when forwarding. Defaults to `/<name>`.
    #[serde(default)]
    pub path: Option<String>,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            port: default_member_port(),
            path: None,
        }
    }

    pub fn tag_value(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }

    pub fn forward_path(&self) -> String {
        match &self.path {
            Some(p) if p.starts_with('/') => p.clone(),
            Some(p) => format!("/{}", p),
            None => format!("/{}", self.name),
        }
    }
}

fn default_member_port() -> u16 {
    8000
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Selection cycle cadence in milliseconds.
    pub interval_ms: u64,

    /// Upper bound on a single probe in milliseconds.
    pub timeout_ms: u64,

    /// Path probed on every member.
    pub path: String,

    /// Probe the members of one pool in parallel within a cycle.
    pub concurrent: bool,
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            timeout_ms: 2_000,
            path: "/".to_string(),
            concurrent: true,
        }
    }
}

/// Request forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Deadline for the backend call including the full body read.
    pub timeout_ms: u64,

    /// Largest backend body that will be buffered.
    pub max_body_bytes: usize,
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Inventory backend selector.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKind {
    /// Instances declared in this file.
    #[default]
    Static,
    /// Remote paginated JSON inventory API.
    Http,
}

/// Membership inventory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub kind: InventoryKind,

    /// Tag key whose value names the pool (e.g. "Cluster").
    pub tag_key: String,

    /// Administrative state members must be in.
    pub state: String,

    /// Maximum addresses per page.
    pub page_size: usize,

    /// Base URL of the HTTP inventory API.
    pub endpoint: Option<String>,

    /// Deadline for a single page request in milliseconds.
    pub request_timeout_ms: u64,

    /// Attempts per page before the inventory is declared unreachable.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Periodic re-resolution cadence. 0 resolves once at startup.
    pub refresh_interval_ms: u64,

    /// Instances served by the static inventory.
    pub instances: Vec<InstanceConfig>,
}

impl InventoryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_ms > 0).then(|| Duration::from_millis(self.refresh_interval_ms))
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            kind: InventoryKind::Static,
            tag_key: "Cluster".to_string(),
            state: "running".to_string(),
            page_size: 100,
            endpoint: None,
            request_timeout_ms: 5_000,
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            refresh_interval_ms: 0,
            instances: Vec::new(),
        }
    }
}

/// One instance known to the static inventory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    /// Host or `host:port`.
    pub address: String,

    #[serde(default = "default_instance_state")]
    pub state: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl InstanceConfig {
    pub fn tagged(address: impl Into<String>, key: &str, value: &str) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(key.to_string(), value.to_string());
        Self {
            address: address.into(),
            state: default_instance_state(),
            tags,
        }
    }
}

fn default_instance_state() -> String {
    "running".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
