// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::correlation_service::CorrelationService;
use crate::application::dataset_service::DatasetService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::memory_store::{InMemoryDatasetRepository, InMemoryRunRepository};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_correlation, create_correlations_batch, delete_dataset, get_correlation, get_dataset,
    health_check, ingest_dataset, ingest_datasets_batch, list_correlations, list_datasets,
    quick_validate,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;

    // Backing stores (infrastructure layer)
    let dataset_repository = Arc::new(InMemoryDatasetRepository::new());
    let run_repository = Arc::new(InMemoryRunRepository::new());

    // Services (application layer)
    let dataset_service = DatasetService::new(dataset_repository.clone());
    let correlation_service =
        CorrelationService::new(dataset_repository, run_repository, config.engine.clone());

    let state = Arc::new(AppState { dataset_service, correlation_service });

    // Router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/datasets", post(ingest_dataset).get(list_datasets))
        .route("/datasets/batch", post(ingest_datasets_batch))
        .route("/datasets/:id", get(get_dataset).delete(delete_dataset))
        .route("/correlations", post(create_correlation).get(list_correlations))
        .route("/correlations/batch", post(create_correlations_batch))
        .route("/correlations/validate", post(quick_validate))
        .route("/correlations/:id", get(get_correlation))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("starting silicon-correlation service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
