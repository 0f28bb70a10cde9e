//! dockbook-discovery — resolve a service endpoint from the local
//! discovery agent's catalog.
//!
//! # Flow
//!
//! ```text
//! Resolver::resolve("redis")
//!   ├── CatalogClient::fetch_service()   GET /v1/catalog/service/redis
//!   └── catalog::select_endpoint()       first entry → Endpoint
//! ```
//!
//! Resolution runs once at startup. There is no caching, no retry and no
//! health filtering: the first registered instance wins.

pub mod catalog;
pub mod client;
pub mod error;
pub mod resolver;

pub use catalog::{CatalogEntry, select_endpoint};
pub use client::{AgentAddress, CatalogClient};
pub use error::{DiscoveryError, DiscoveryResult};
pub use resolver::{Resolver, resolve};
