//! HTTP client for the discovery agent's catalog API.
//!
//! One request per lookup over a fresh HTTP/1.1 connection, the same way
//! a health probe talks to an instance. The whole exchange (connect,
//! request, body) is bounded by a single timeout.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, HOST, USER_AGENT};
use http::{HeaderValue, Method};
use http_body_util::{BodyExt, Empty, Limited};
use tracing::debug;
use url::{Host, Url};

use dockbook_core::Endpoint;

use crate::error::{DiscoveryError, DiscoveryResult};

/// Default bound on a catalog request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Catalog responses larger than this are refused.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

const TOKEN_HEADER: &str = "x-consul-token";

/// Parsed agent base address: `host:port` or `http://host:port[/prefix]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAddress {
    base: Url,
    host: String,
    port: u16,
}

impl AgentAddress {
    /// Parse an agent address. A missing scheme means `http://`, a missing
    /// port means 80. Any scheme other than `http` is rejected, as are
    /// credentials, queries and fragments.
    pub fn parse(raw: &str) -> DiscoveryResult<Self> {
        let invalid = || DiscoveryError::InvalidAgentAddress(raw.to_string());
        let trimmed = raw.trim();

        let base = if trimmed.contains("://") {
            Url::parse(trimmed)
        } else {
            Url::parse(&format!("http://{trimmed}"))
        }
        .map_err(|_| invalid())?;

        if base.scheme() != "http"
            || base.cannot_be_a_base()
            || !base.username().is_empty()
            || base.password().is_some()
            || base.query().is_some()
            || base.fragment().is_some()
        {
            return Err(invalid());
        }

        let host = match base.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => return Err(invalid()),
        };
        let port = match base.port_or_known_default() {
            Some(port) if port != 0 => port,
            _ => return Err(invalid()),
        };

        Ok(Self { base, host, port })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Full URL of the catalog entries for `service`.
    pub fn service_url(&self, service: &str) -> Url {
        let mut url = self.base.clone();
        // `parse` only accepts http URLs, which always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "catalog", "service", service]);
        }
        url
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str().trim_end_matches('/'))
    }
}

/// Client for `GET /v1/catalog/service/{name}`.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    agent: AgentAddress,
    token: Option<HeaderValue>,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(agent: AgentAddress) -> Self {
        Self {
            agent,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send `token` as the ACL token on every request.
    pub fn with_token(mut self, token: &str) -> DiscoveryResult<Self> {
        let mut value = HeaderValue::from_str(token).map_err(|_| {
            DiscoveryError::InvalidRequest("token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        self.token = Some(value);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn agent(&self) -> &AgentAddress {
        &self.agent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request path for a service's catalog entries.
    pub fn service_path(&self, service: &str) -> String {
        self.agent.service_url(service).path().to_string()
    }

    /// Fetch the raw catalog body for `service`.
    ///
    /// Connection failures, non-2xx answers and timeouts are all
    /// [`DiscoveryError::Unavailable`]. The body is returned unparsed.
    pub async fn fetch_service(&self, service: &str) -> DiscoveryResult<Bytes> {
        let path = self.service_path(service);
        match tokio::time::timeout(self.timeout, self.get(&path)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(agent = %self.agent, %path, "catalog request timed out");
                Err(DiscoveryError::Unavailable(format!(
                    "{} did not answer within {:?}",
                    self.agent, self.timeout
                )))
            }
        }
    }

    async fn get(&self, path: &str) -> DiscoveryResult<Bytes> {
        let authority = self.agent.endpoint().authority();

        let stream = tokio::net::TcpStream::connect((self.agent.host.as_str(), self.agent.port))
            .await
            .map_err(|e| {
                debug!(error = %e, agent = %self.agent, "catalog connection failed");
                DiscoveryError::Unavailable(format!("connect to {authority}: {e}"))
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| DiscoveryError::Unavailable(format!("handshake with {authority}: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "catalog connection closed with error");
            }
        });

        let mut builder = http::Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(HOST, authority.as_str())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, "dockbook-discovery/0.1");
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token.clone());
        }
        let req = builder
            .body(Empty::<Bytes>::new())
            .map_err(|e| DiscoveryError::InvalidRequest(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| DiscoveryError::Unavailable(format!("GET {path} on {authority}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, %path, "catalog answered non-2xx");
            return Err(DiscoveryError::Unavailable(format!(
                "GET {path} on {authority} answered {status}"
            )));
        }

        let body = Limited::new(resp.into_body(), MAX_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| DiscoveryError::Unavailable(format!("reading catalog body: {e}")))?
            .to_bytes();

        debug!(%path, bytes = body.len(), "catalog body received");
        Ok(body)
    }
}
