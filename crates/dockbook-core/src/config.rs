//! dockbook.toml configuration parser.
//!
//! Every field is optional in the file; anything left out falls back to
//! [`AppConfig::default`]. The daemon overlays environment variables and
//! CLI flags on top of whatever this produces.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Endpoint;

/// Errors raised while validating a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be a port between 1 and 65535")]
    InvalidPort(&'static str),

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("unknown store mode {0:?} (expected discovered, fixed or memory)")]
    UnknownStoreMode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind. Ignored when `bind_service` is set.
    pub bind: String,
    pub port: u16,
    /// Look this service up in the catalog and bind its `ServiceAddress`.
    pub bind_service: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 4567,
            bind_service: None,
        }
    }
}

/// Where the key-value store endpoint comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Ask the discovery agent's catalog for `store.service`.
    #[default]
    Discovered,
    /// Connect to `store.host:store.port` as configured.
    Fixed,
    /// Keep values in process memory; no Redis at all.
    Memory,
}

impl FromStr for StoreMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovered" => Ok(StoreMode::Discovered),
            "fixed" => Ok(StoreMode::Fixed),
            "memory" => Ok(StoreMode::Memory),
            other => Err(ConfigError::UnknownStoreMode(other.to_string())),
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreMode::Discovered => "discovered",
            StoreMode::Fixed => "fixed",
            StoreMode::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub mode: StoreMode,
    /// Catalog service name, used in `discovered` mode.
    pub service: String,
    /// Store host, used in `fixed` mode.
    pub host: String,
    /// Store port, used in `fixed` mode.
    pub port: u16,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::Discovered,
            service: "redis".to_string(),
            host: "redisdb".to_string(),
            port: 6379,
        }
    }
}

impl StoreConfig {
    pub fn fixed_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Agent base address, `host:port` or `http://host:port`.
    pub agent_addr: String,
    /// ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,
    /// Bound on the whole catalog request, e.g. "5s" or "500ms".
    pub timeout: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            agent_addr: "127.0.0.1:8500".to_string(),
            token: None,
            timeout: "5s".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.timeout)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| ConfigError::InvalidDuration(self.timeout.clone()))
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Whether startup has to talk to the discovery agent at all.
    pub fn needs_discovery(&self) -> bool {
        self.store.mode == StoreMode::Discovered || self.server.bind_service.is_some()
    }

    /// Check the settings the selected mode actually uses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.server.bind_service {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::Empty("server.bind_service"));
            }
            Some(_) => {}
            None if self.server.bind.trim().is_empty() => {
                return Err(ConfigError::Empty("server.bind"));
            }
            None => {}
        }

        match self.store.mode {
            StoreMode::Discovered => {
                if self.store.service.trim().is_empty() {
                    return Err(ConfigError::Empty("store.service"));
                }
            }
            StoreMode::Fixed => {
                if self.store.host.trim().is_empty() {
                    return Err(ConfigError::Empty("store.host"));
                }
                if self.store.port == 0 {
                    return Err(ConfigError::InvalidPort("store.port"));
                }
            }
            StoreMode::Memory => {}
        }

        if self.needs_discovery() {
            if self.discovery.agent_addr.trim().is_empty() {
                return Err(ConfigError::Empty("discovery.agent_addr"));
            }
            self.discovery.timeout()?;
        }

        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// Minute counts too large to express in seconds yield `None`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
