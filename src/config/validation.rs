//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0, addresses parse)
//! - Detect duplicate or unroutable pool names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::{InventoryKind, RouterConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one pool must be configured")]
    NoPools,

    #[error("pool name {0:?} must be a non-empty single path segment")]
    InvalidPoolName(String),

    #[error("pool {0:?} is defined more than once")]
    DuplicatePool(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("http inventory requires inventory.endpoint")]
    MissingEndpoint,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pools.is_empty() {
        errors.push(ValidationError::NoPools);
    }

    let mut seen = HashSet::new();
    for pool in &config.pools {
        let name = pool.name.as_str();
        if name.is_empty() || name.contains('/') || name.contains('{') || name.contains('}') {
            errors.push(ValidationError::InvalidPoolName(name.to_string()));
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicatePool(name.to_string()));
        }
    }

    let positive = [
        ("probe.interval_ms", config.probe.interval_ms),
        ("probe.timeout_ms", config.probe.timeout_ms),
        ("forward.timeout_ms", config.forward.timeout_ms),
        ("listener.request_timeout_ms", config.listener.request_timeout_ms),
        ("inventory.request_timeout_ms", config.inventory.request_timeout_ms),
        ("inventory.page_size", config.inventory.page_size as u64),
        ("inventory.max_attempts", u64::from(config.inventory.max_attempts)),
        ("forward.max_body_bytes", config.forward.max_body_bytes as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let listen = config.listener.bind_address();
    if listen.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener",
            value: listen,
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.inventory.kind == InventoryKind::Http
        && config.inventory.endpoint.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::MissingEndpoint);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PoolConfig;

    fn valid() -> RouterConfig {
        RouterConfig {
            pools: vec![PoolConfig::new("cluster1"), PoolConfig::new("cluster2")],
            ..RouterConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_admin_and_metrics_are_ordinary_pool_names() {
        let mut config = valid();
        config.pools.push(PoolConfig::new("admin"));
        config.pools.push(PoolConfig::new("metrics"));
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.pools.push(PoolConfig::new("cluster1"));
        config.pools.push(PoolConfig::new("a/b"));
        config.probe.interval_ms = 0;
        config.inventory.kind = InventoryKind::Http;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicatePool("cluster1".into())));
        assert!(errors.contains(&ValidationError::InvalidPoolName("a/b".into())));
        assert!(errors.contains(&ValidationError::Zero { field: "probe.interval_ms" }));
        assert!(errors.contains(&ValidationError::MissingEndpoint));
    }

    #[test]
    fn test_requires_pools() {
        let errors = validate_config(&RouterConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoPools]);
    }

    #[test]
    fn test_timeout_longer_than_interval_is_accepted() {
        let mut config = valid();
        config.probe.interval_ms = 100;
        config.probe.timeout_ms = 2_000;
        assert!(validate_config(&config).is_ok());
    }
}
