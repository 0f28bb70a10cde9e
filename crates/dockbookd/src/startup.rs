//! Ordered startup: resolve → build adapter → serve.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use dockbook_core::{AppConfig, Endpoint, StoreMode};
use dockbook_discovery::Resolver;
use dockbook_store::{KvStore, MemoryStore, RedisStore};

/// Everything the server needs, produced before any listener exists.
#[derive(Debug)]
pub struct Prepared {
    pub store: Arc<dyn KvStore>,
    /// `None` in memory mode.
    pub store_endpoint: Option<Endpoint>,
    pub bind_addr: SocketAddr,
}

/// Resolve endpoints and build the store adapter.
///
/// Every discovery failure is returned as-is (wrapped in context), so the
/// caller can abort before binding.
pub async fn prepare(config: &AppConfig) -> anyhow::Result<Prepared> {
    config.validate().context("invalid configuration")?;

    let resolver = if config.needs_discovery() {
        Some(Resolver::from_config(&config.discovery).context("configuring discovery client")?)
    } else {
        None
    };

    // ── Store endpoint ─────────────────────────────────────────
    let store_endpoint = match config.store.mode {
        StoreMode::Discovered => {
            let resolver = resolver.as_ref().context("discovery client not configured")?;
            let endpoint = resolver
                .resolve(&config.store.service)
                .await
                .with_context(|| format!("resolving store service {:?}", config.store.service))?;
            Some(endpoint)
        }
        StoreMode::Fixed => {
            let endpoint = config.store.fixed_endpoint();
            info!(%endpoint, "using fixed store endpoint");
            Some(endpoint)
        }
        StoreMode::Memory => {
            warn!("using in-memory store; values are lost on restart");
            None
        }
    };

    // ── Store adapter ──────────────────────────────────────────
    let store: Arc<dyn KvStore> = match &store_endpoint {
        Some(endpoint) => Arc::new(
            RedisStore::new(endpoint.clone()).context("building store adapter")?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    // ── Bind address ───────────────────────────────────────────
    let bind_host = match &config.server.bind_service {
        Some(service) => {
            let resolver = resolver.as_ref().context("discovery client not configured")?;
            resolver
                .resolve(service)
                .await
                .with_context(|| format!("resolving bind service {service:?}"))?
                .host
        }
        None => config.server.bind.clone(),
    };
    let bind_addr = tokio::net::lookup_host((bind_host.as_str(), config.server.port))
        .await
        .with_context(|| format!("looking up bind host {bind_host:?}"))?
        .next()
        .with_context(|| format!("bind host {bind_host:?} has no addresses"))?;

    let endpoint_label = store_endpoint
        .as_ref()
        .map_or_else(|| "memory".to_string(), ToString::to_string);
    info!(
        mode = %config.store.mode,
        endpoint = %endpoint_label,
        %bind_addr,
        "startup configuration resolved"
    );

    Ok(Prepared {
        store,
        store_endpoint,
        bind_addr,
    })
}

/// Serve the API on `listener` until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    store: Arc<dyn KvStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = dockbook_api::build_router(store);
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

/// Full startup sequence followed by serving.
pub async fn run(
    config: AppConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!(mode = %config.store.mode, "dockbook starting");

    let prepared = prepare(&config).await?;
    let listener = TcpListener::bind(prepared.bind_addr)
        .await
        .with_context(|| format!("binding {}", prepared.bind_addr))?;

    serve(listener, prepared.store, shutdown).await
}

/// Completes on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
