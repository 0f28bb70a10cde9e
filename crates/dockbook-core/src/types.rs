//! Shared types used across dockbook crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resolved `(host, port)` pair for a network service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_plain_host() {
        let ep = Endpoint::new("10.0.0.5", 6379);
        assert_eq!(ep.authority(), "10.0.0.5:6379");
        assert_eq!(ep.to_string(), "10.0.0.5:6379");
    }

    #[test]
    fn authority_brackets_ipv6() {
        let ep = Endpoint::new("::1", 8500);
        assert_eq!(ep.authority(), "[::1]:8500");
    }
}
