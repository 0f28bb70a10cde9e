pub mod config;
pub mod types;

pub use config::{AppConfig, ConfigError, DiscoveryConfig, ServerConfig, StoreConfig, StoreMode};
pub use types::Endpoint;
