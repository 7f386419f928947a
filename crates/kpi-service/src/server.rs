//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::router::cors_layer;
use crate::api::rest::state::AppState;
use crate::config::{ServiceConfig, StorageConfig};
use crate::error::{ServiceError, ServiceResult};
use kpi_engine::{
    CatalogSeed, Clock, GovernanceEngine, GovernanceStore, InMemoryStore, JournalStore,
    SystemClock,
};
use kpi_types::TenantId;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Open the configured store, restore the engine and apply the catalog seed.
pub async fn bootstrap(config: &ServiceConfig, clock: Arc<dyn Clock>) -> ServiceResult<AppState> {
    let store: Arc<dyn GovernanceStore> = match &config.storage {
        StorageConfig::Memory => Arc::new(InMemoryStore::new()),
        StorageConfig::Journal { path } => Arc::new(JournalStore::open(path.clone()).await?),
    };

    let period_clock = config.window.period_clock()?;
    let policy = Arc::new(config.access.policy());
    let engine = GovernanceEngine::open(store, period_clock, policy).await?;

    if let Some(path) = &config.catalog.seed {
        let seed = CatalogSeed::from_path(path).await?;
        let tenant = TenantId::new(config.catalog.tenant.clone());
        let summary = engine.seed_catalog(&tenant, seed).await?;
        tracing::info!(
            path = %path.display(),
            tenant = %tenant,
            processes = summary.processes_added,
            indicators = summary.indicators_added,
            skipped = summary.skipped,
            "Catalog seed applied"
        );
    }

    Ok(AppState::new(Arc::new(engine), clock))
}

/// kpid server
pub struct Server {
    config: ServiceConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let state = bootstrap(&config, Arc::new(SystemClock)).await?;
        Ok(Self { config, state })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> ServiceResult<()> {
        let addr = self.config.server.listen_addr;

        let mut app = create_router(self.state);
        if self.config.server.enable_cors {
            app = app.layer(cors_layer());
        }

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("kpid listening on {}", addr);
        tracing::info!(
            start_day = self.config.window.start_day,
            end_day = self.config.window.end_day,
            utc_offset_minutes = self.config.window.utc_offset_minutes,
            "Entry window"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("kpid shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
