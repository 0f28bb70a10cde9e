//! One-shot service resolution against the catalog.

use tracing::{info, warn};

use dockbook_core::{DiscoveryConfig, Endpoint};

use crate::catalog::select_endpoint;
use crate::client::{AgentAddress, CatalogClient};
use crate::error::{DiscoveryError, DiscoveryResult};

/// Resolves service names to endpoints through one discovery agent.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: CatalogClient,
}

impl Resolver {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    /// Build a resolver from the `[discovery]` config section.
    pub fn from_config(config: &DiscoveryConfig) -> DiscoveryResult<Self> {
        let agent = AgentAddress::parse(&config.agent_addr)?;
        let timeout = config
            .timeout()
            .map_err(|e| DiscoveryError::InvalidRequest(e.to_string()))?;

        let mut client = CatalogClient::new(agent).with_timeout(timeout);
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            client = client.with_token(token)?;
        }
        Ok(Self::new(client))
    }

    pub fn agent(&self) -> &AgentAddress {
        self.client.agent()
    }

    /// Look `service` up and return the first registered instance.
    pub async fn resolve(&self, service: &str) -> DiscoveryResult<Endpoint> {
        info!(%service, agent = %self.client.agent(), "resolving service from catalog");

        let result = match self.client.fetch_service(service).await {
            Ok(body) => select_endpoint(service, &body),
            Err(e) => Err(e),
        };

        match &result {
            Ok(endpoint) => info!(%service, %endpoint, "service resolved"),
            Err(e) => warn!(%service, error = %e, "service resolution failed"),
        }
        result
    }
}

/// Resolve `service_name` through the agent at `agent_base_url` using
/// default client settings.
pub async fn resolve(service_name: &str, agent_base_url: &str) -> DiscoveryResult<Endpoint> {
    let agent = AgentAddress::parse(agent_base_url)?;
    Resolver::new(CatalogClient::new(agent)).resolve(service_name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn from_config_applies_timeout_and_token() {
        let config = DiscoveryConfig {
            agent_addr: "http://consul:8500".to_string(),
            token: Some("secret".to_string()),
            timeout: "750ms".to_string(),
        };
        let resolver = Resolver::from_config(&config).unwrap();
        assert_eq!(resolver.agent().endpoint(), Endpoint::new("consul", 8500));
        assert_eq!(resolver.client.timeout(), Duration::from_millis(750));
    }

    #[test]
    fn from_config_rejects_bad_timeout() {
        let config = DiscoveryConfig {
            timeout: "later".to_string(),
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            Resolver::from_config(&config),
            Err(DiscoveryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn from_config_rejects_https_agent() {
        let config = DiscoveryConfig {
            agent_addr: "https://consul:8501".to_string(),
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            Resolver::from_config(&config),
            Err(DiscoveryError::InvalidAgentAddress(_))
        ));
    }
}
