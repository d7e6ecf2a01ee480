//! Silo API /v1: tenant-scoped analyst runs over HTTP
//!
//! | Route | Method | Notes |
//! |-------|--------|-------|
//! | `/v1/analyze` | POST | requires `x-tenant-id` |
//! | `/v1/health` | GET | |
//! | `/metrics` | GET | prometheus text format |
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use crate::config::Settings;
use crate::metrics::Metrics;
use axum::{
    routing::{get, post},
    Router,
};
use silo_core::{PipelineEngine, TenantRegistry};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub registry: TenantRegistry,
    pub engine: Arc<PipelineEngine>,
    pub metrics: Arc<Metrics>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        registry: TenantRegistry,
        engine: PipelineEngine,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            registry,
            engine: Arc::new(engine),
            metrics: Arc::new(Metrics::new()?),
            settings: Arc::new(settings),
        })
    }

    /// State for the bundled reference scenario, honoring configured tenants
    /// and audit profile
    pub fn reference(settings: Settings) -> anyhow::Result<Self> {
        let registry = settings.load_registry()?;
        let auditor = settings.load_auditor()?;
        let engine = silo_stages::reference_engine(
            Arc::new(silo_stages::reference_graph()?),
            Arc::new(silo_stages::reference_documents()?),
            Arc::new(auditor),
        );
        Ok(Self::new(settings, registry, engine)?)
    }
}

pub fn create_app(state: AppState) -> Router {
    let scoped = Router::new()
        .route("/v1/analyze", post(handlers::analyze))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant_scope,
        ));

    Router::new()
        .merge(scoped)
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
        .with_state(state)
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.addr.clone();
    let state = AppState::reference(settings)?;
    tracing::info!(
        tenants = ?state.registry.tenant_ids(),
        pipeline = %state.engine.pipeline_id(),
        "tenant registry loaded"
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Silo API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
}
