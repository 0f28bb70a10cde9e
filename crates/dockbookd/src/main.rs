//! dockbookd — Redis-backed webapp with catalog-based store discovery.
//!
//! # Usage
//!
//! ```text
//! CONSUL_HTTP_ADDR=127.0.0.1:8500 dockbookd serve
//! dockbookd serve --store-mode fixed --store-host redisdb --store-port 6379
//! dockbookd resolve redis
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dockbook_discovery::Resolver;
use dockbookd::cli::{ConfigArgs, LogFormat};
use dockbookd::startup;

#[derive(Parser)]
#[command(name = "dockbookd", about = "Redis-backed dockbook webapp", version)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the store endpoint, then serve the HTTP API.
    Serve(ConfigArgs),

    /// Look a service up in the catalog and print its endpoint.
    Resolve {
        /// Service name (default: the configured store service).
        service: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dockbookd=debug,dockbook=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve(args) => {
            let config = args.load()?;
            startup::run(config, startup::shutdown_signal()).await
        }
        Command::Resolve { service, config } => {
            let config = config.load()?;
            let service = service.unwrap_or_else(|| config.store.service.clone());
            let resolver =
                Resolver::from_config(&config.discovery).context("configuring discovery client")?;
            let endpoint = resolver
                .resolve(&service)
                .await
                .with_context(|| format!("resolving service {service:?}"))?;
            println!("{endpoint}");
            Ok(())
        }
        Command::Config(args) => {
            let config = args.load()?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
