//! Command-line and environment overlay on top of the config file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};

use dockbook_core::{AppConfig, StoreMode};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings shared by every subcommand. Anything left unset keeps the
/// value from the config file, or the built-in default.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Path to a dockbook.toml file.
    #[arg(long, env = "DOCKBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind the HTTP server on.
    #[arg(long)]
    pub bind: Option<String>,

    /// HTTP port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Resolve the bind address from this catalog service instead of --bind.
    #[arg(long)]
    pub bind_service: Option<String>,

    /// Where the store endpoint comes from: discovered, fixed or memory.
    #[arg(long)]
    pub store_mode: Option<StoreMode>,

    /// Catalog service name of the store (discovered mode).
    #[arg(long)]
    pub service: Option<String>,

    /// Store host (fixed mode).
    #[arg(long)]
    pub store_host: Option<String>,

    /// Store port (fixed mode).
    #[arg(long)]
    pub store_port: Option<u16>,

    /// Discovery agent address, `host:port` or `http://host:port`.
    #[arg(long, env = "CONSUL_HTTP_ADDR")]
    pub agent_addr: Option<String>,

    /// ACL token for the discovery agent.
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Bound on the catalog request, e.g. "5s" or "500ms".
    #[arg(long)]
    pub discovery_timeout: Option<String>,
}

impl ConfigArgs {
    /// Load the config file (if any) and apply these overrides.
    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(service) = &self.bind_service {
            config.server.bind_service = Some(service.clone());
        }
        if let Some(mode) = self.store_mode {
            config.store.mode = mode;
        }
        if let Some(service) = &self.service {
            config.store.service = service.clone();
        }
        if let Some(host) = &self.store_host {
            config.store.host = host.clone();
        }
        if let Some(port) = self.store_port {
            config.store.port = port;
        }
        if let Some(addr) = &self.agent_addr {
            config.discovery.agent_addr = addr.clone();
        }
        if let Some(token) = &self.consul_token {
            config.discovery.token = Some(token.clone());
        }
        if let Some(timeout) = &self.discovery_timeout {
            config.discovery.timeout = timeout.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ConfigArgs,
    }

    fn parse(argv: &[&str]) -> ConfigArgs {
        let mut full = vec!["dockbookd"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--store-mode",
            "fixed",
            "--store-host",
            "redisdb",
            "--store-port",
            "6380",
            "--port",
            "8080",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.store.mode, StoreMode::Fixed);
        assert_eq!(config.store.host, "redisdb");
        assert_eq!(config.store.port, 6380);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let mut config: AppConfig = toml::from_str("[store]\nservice = \"cache\"\n").unwrap();
        ConfigArgs::default().apply(&mut config);
        assert_eq!(config.store.service, "cache");
    }

    #[test]
    fn discovery_flags() {
        let args = parse(&[
            "--agent-addr",
            "http://consul:8500",
            "--consul-token",
            "t0k3n",
            "--discovery-timeout",
            "250ms",
            "--bind-service",
            "sinatra",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.discovery.agent_addr, "http://consul:8500");
        assert_eq!(config.discovery.token.as_deref(), Some("t0k3n"));
        assert_eq!(config.discovery.timeout, "250ms");
        assert_eq!(config.server.bind_service.as_deref(), Some("sinatra"));
    }

    #[test]
    fn unknown_store_mode_rejected() {
        let result = TestCli::try_parse_from(["dockbookd", "--store-mode", "etcd"]);
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_config_file() {
        let path = std::env::temp_dir().join(format!("dockbook-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nport = 9000\n[store]\nmode = \"memory\"\n").unwrap();

        let args = ConfigArgs {
            config: Some(path.clone()),
            port: Some(9100),
            ..ConfigArgs::default()
        };
        let config = args.load().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.store.mode, StoreMode::Memory);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn load_reports_missing_file() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/dockbook.toml")),
            ..ConfigArgs::default()
        };
        let err = args.load().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dockbook.toml"));
    }
}
