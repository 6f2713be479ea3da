//! Service resilience orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌────────────────────────────────────────────────────────────────┐
//!     │                     SERVICE ORCHESTRATOR                        │
//!     │                                                                 │
//!     │   config ──▶ ServiceFactory ──▶ register ──▶ initialize_services │
//!     │                                      │                          │
//!     │        ┌─────────────────────────────┼──────────────────┐       │
//!     │        ▼                             ▼                  ▼       │
//!     │   ┌──────────┐               ┌──────────────┐    ┌──────────┐   │
//!     │   │   chat   │               │  documents   │    │  feeds   │   │
//!     │   │  facade  │               │    facade    │    │  facade  │   │
//!     │   └────┬─────┘               └──────┬───────┘    └────┬─────┘   │
//!     │        │  breaker / retry / cache / metrics / probe    │         │
//!     │        ▼                            ▼                  ▼         │
//!     │   ChatService               DocumentService       FeedService   │
//!     │                                                                 │
//!     │   HealthMonitor ──▶ perform_health_checks ──▶ status            │
//!     │   MetricsCollector ──▶ Prometheus gauges                        │
//!     │   admin API (optional) ──▶ status / health / dashboard          │
//!     └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary wires the in-memory reference services; a real deployment
//! supplies its own [`ServiceInstances`].

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use service_resilience::admin::{setup_admin_router, AdminState};
use service_resilience::config::{load_config, OrchestratorConfig};
use service_resilience::lifecycle::signals::wait_for_shutdown_signal;
use service_resilience::observability::{logging::init_logging, metrics::init_metrics};
use service_resilience::orchestrator::{ServiceFactory, ServiceInstances};
use service_resilience::services::memory::{EchoChat, InMemoryDocuments, InMemoryFeeds};

#[derive(Parser)]
#[command(name = "service-resilience")]
#[command(about = "Runs the service orchestrator with in-memory services", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => OrchestratorConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-resilience starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let instances = ServiceInstances {
        chat: Some(Arc::new(EchoChat::new())),
        documents: Some(Arc::new(InMemoryDocuments::new())),
        feeds: Some(Arc::new(InMemoryFeeds::new())),
    };
    let admin = config.admin.clone();
    let orchestrator = ServiceFactory::create(config, instances).await?;

    if !orchestrator.initialize_services().await? {
        tracing::error!("Critical services failed to initialize");
        orchestrator.shutdown().await;
        return Err("critical services failed to initialize".into());
    }

    let admin_server = if admin.enabled {
        let listener = TcpListener::bind(&admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        let router = setup_admin_router(AdminState::new(orchestrator.clone(), &admin.api_key));
        Some(tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(wait_for_shutdown_signal())
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API server error");
            }
        }))
    } else {
        None
    };

    wait_for_shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    let report = orchestrator.shutdown().await;
    if let Some(server) = admin_server {
        server.abort();
    }

    tracing::info!(
        stopped = ?report.stopped,
        failed = ?report.failed,
        "Shutdown complete"
    );
    Ok(())
}
