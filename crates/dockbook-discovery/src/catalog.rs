//! Catalog response parsing and endpoint selection.
//!
//! The agent answers `GET /v1/catalog/service/{name}` with a JSON array of
//! registrations. Only the fields needed to pick an endpoint are modelled;
//! everything else in an entry is ignored.

use serde::Deserialize;
use tracing::debug;

use dockbook_core::Endpoint;

use crate::error::{DiscoveryError, DiscoveryResult};

/// One registered service instance.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "Node")]
    pub node: Option<String>,
    /// Address of the node the service runs on.
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "ServiceID")]
    pub service_id: Option<String>,
    #[serde(rename = "ServiceAddress")]
    pub service_address: Option<String>,
    #[serde(rename = "ServicePort")]
    pub service_port: Option<PortValue>,
}

/// `ServicePort` as sent by the agent: normally a number, sometimes a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u64),
    Text(String),
}

impl PortValue {
    fn to_port(&self) -> Option<u16> {
        let port = match self {
            PortValue::Number(n) => u16::try_from(*n).ok()?,
            PortValue::Text(s) => s.trim().parse::<u16>().ok()?,
        };
        (port != 0).then_some(port)
    }
}

impl CatalogEntry {
    /// Extract the endpoint this entry advertises.
    ///
    /// Addresses are returned as the agent sent them. An empty
    /// `ServiceAddress` means the service registered without one; the node
    /// `Address` is used instead.
    pub fn endpoint(&self) -> DiscoveryResult<Endpoint> {
        let service_address = self
            .service_address
            .as_deref()
            .ok_or_else(|| malformed("entry has no ServiceAddress"))?;

        let host = if service_address.is_empty() {
            self.address
                .as_deref()
                .filter(|a| !a.is_empty())
                .ok_or_else(|| malformed("ServiceAddress is empty and the node has no Address"))?
        } else {
            service_address
        };

        let port_value = self
            .service_port
            .as_ref()
            .ok_or_else(|| malformed("entry has no ServicePort"))?;
        let port = port_value.to_port().ok_or_else(|| {
            malformed(&format!("ServicePort {port_value:?} is not a port in 1-65535"))
        })?;

        Ok(Endpoint::new(host, port))
    }
}

/// Pick the endpoint of the first registration in a catalog response body.
pub fn select_endpoint(service: &str, body: &[u8]) -> DiscoveryResult<Endpoint> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| malformed(&format!("expected a JSON array: {e}")))?;

    debug!(%service, count = entries.len(), "catalog entries received");

    let Some(first) = entries.into_iter().next() else {
        return Err(DiscoveryError::NotFound {
            service: service.to_string(),
        });
    };

    let entry: CatalogEntry = serde_json::from_value(first)
        .map_err(|e| malformed(&format!("first entry: {e}")))?;

    let endpoint = entry.endpoint()?;
    debug!(
        %service,
        node = entry.node.as_deref().unwrap_or("-"),
        service_id = entry.service_id.as_deref().unwrap_or("-"),
        %endpoint,
        "selected first catalog entry"
    );
    Ok(endpoint)
}

fn malformed(msg: &str) -> DiscoveryError {
    DiscoveryError::MalformedResponse(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(body: &str) -> DiscoveryResult<Endpoint> {
        select_endpoint("redis", body.as_bytes())
    }

    #[test]
    fn first_entry_verbatim() {
        let ep = select(r#"[{"ServiceAddress":"10.0.0.5","ServicePort":6379}]"#).unwrap();
        assert_eq!(ep, Endpoint::new("10.0.0.5", 6379));
    }

    #[test]
    fn service_address_is_not_rewritten() {
        let ep = select(r#"[{"ServiceAddress":" redis.local ","ServicePort":6379}]"#).unwrap();
        assert_eq!(ep, Endpoint::new(" redis.local ", 6379));
    }

    #[test]
    fn first_of_several_wins() {
        let body = r#"[
            {"Node":"a","ServiceAddress":"10.0.0.7","ServicePort":7000},
            {"Node":"b","ServiceAddress":"10.0.0.8","ServicePort":7001}
        ]"#;
        assert_eq!(select(body).unwrap(), Endpoint::new("10.0.0.7", 7000));
    }

    #[test]
    fn later_entries_are_not_inspected() {
        let body = r#"[{"ServiceAddress":"redisdb","ServicePort":6379}, 42]"#;
        assert_eq!(select(body).unwrap(), Endpoint::new("redisdb", 6379));
    }

    #[test]
    fn empty_array_is_not_found() {
        match select("[]") {
            Err(DiscoveryError::NotFound { service }) => assert_eq!(service, "redis"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_service_address_is_malformed() {
        let err = select(r#"[{"ServicePort":6379}]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn missing_service_port_is_malformed() {
        let err = select(r#"[{"ServiceAddress":"10.0.0.5"}]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn mistyped_address_is_malformed() {
        let err = select(r#"[{"ServiceAddress":10,"ServicePort":6379}]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn null_port_is_malformed() {
        let err = select(r#"[{"ServiceAddress":"10.0.0.5","ServicePort":null}]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn numeric_string_port_accepted() {
        let ep = select(r#"[{"ServiceAddress":"10.0.0.5","ServicePort":"6380"}]"#).unwrap();
        assert_eq!(ep.port, 6380);
    }

    #[test]
    fn non_numeric_string_port_is_malformed() {
        let err = select(r#"[{"ServiceAddress":"10.0.0.5","ServicePort":"redis"}]"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn out_of_range_ports_are_malformed() {
        for port in ["0", "65536", "-1", "6379.5"] {
            let body = format!(r#"[{{"ServiceAddress":"10.0.0.5","ServicePort":{port}}}]"#);
            let err = select(&body).unwrap_err();
            assert!(
                matches!(err, DiscoveryError::MalformedResponse(_)),
                "port {port} should be rejected"
            );
        }
    }

    #[test]
    fn empty_service_address_falls_back_to_node_address() {
        let body = r#"[{"Address":"172.17.0.3","ServiceAddress":"","ServicePort":6379}]"#;
        assert_eq!(select(body).unwrap(), Endpoint::new("172.17.0.3", 6379));
    }

    #[test]
    fn empty_addresses_everywhere_is_malformed() {
        let body = r#"[{"Address":"","ServiceAddress":"","ServicePort":6379}]"#;
        let err = select(body).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn object_body_is_malformed() {
        let err = select(r#"{"ServiceAddress":"10.0.0.5","ServicePort":6379}"#).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = select("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let body = r#"[{
            "ID":"40e4a748-2192-161a-0510-9bf59fe950b5",
            "Node":"consul",
            "Address":"172.17.0.2",
            "Datacenter":"dc1",
            "ServiceID":"redis1",
            "ServiceName":"redis",
            "ServiceTags":["primary"],
            "ServiceAddress":"172.17.0.4",
            "ServicePort":6379,
            "ServiceMeta":{}
        }]"#;
        assert_eq!(select(body).unwrap(), Endpoint::new("172.17.0.4", 6379));
    }
}
