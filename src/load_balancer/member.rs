//! Pool member abstraction.
//!
//! # Responsibilities
//! - Represent one backend instance discovered through the inventory
//! - Build the probe and forward URLs for that instance
//!
//! Members are immutable; a membership change replaces the whole list.

use std::fmt;

use url::Url;

/// Error building a member from an inventory address.
#[derive(Debug, thiserror::Error)]
#[error("invalid member address {address:?}: {source}")]
pub struct InvalidMember {
    pub address: String,
    #[source]
    pub source: url::ParseError,
}

/// A single backend instance within a pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// `http://host:port/`, pre-parsed.
    base_url: Url,
    /// Pool-scoped path requested when forwarding.
    path: String,
}

impl Member {
    /// Create a member from an inventory address.
    ///
    /// `address` may be a bare host or `host:port`; a bare host gets
    /// `default_port`.
    pub fn from_address(
        address: &str,
        default_port: u16,
        path: &str,
    ) -> Result<Self, InvalidMember> {
        let address = address.trim();
        let authority = if has_port(address) {
            address.to_string()
        } else if address.contains(':') && !address.starts_with('[') {
            format!("[{}]:{}", address, default_port)
        } else {
            format!("{}:{}", address, default_port)
        };

        let base_url = Url::parse(&format!("http://{}/", authority)).map_err(|source| {
            InvalidMember {
                address: address.to_string(),
                source,
            }
        })?;
        if base_url.host_str().map_or(true, str::is_empty) {
            return Err(InvalidMember {
                address: address.to_string(),
                source: url::ParseError::EmptyHost,
            });
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Ok(Self { base_url, path })
    }

    /// `host:port` of this member.
    pub fn authority(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port_or_known_default() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Pool-scoped forward path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL probed by the health checker.
    pub fn probe_url(&self, health_path: &str) -> String {
        self.url_for(health_path, None)
    }

    /// URL a forwarded request is sent to.
    pub fn forward_url(&self, query: Option<&str>) -> String {
        self.url_for(&self.path, query)
    }

    fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(query.filter(|q| !q.is_empty()));
        url.to_string()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.authority(), self.path)
    }
}

fn has_port(address: &str) -> bool {
    if let Some(rest) = address.strip_prefix('[') {
        // [v6]:port
        return rest.split_once("]:").is_some();
    }
    match address.rsplit_once(':') {
        Some((host, port)) => !host.contains(':') && port.parse::<u16>().is_ok(),
        None => false,
    }
}
