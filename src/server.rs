//! Router assembly and middleware layering, following the
//! `main.rs` → `server::start_server` split and the trace/timeout/cors
//! `.layer()` stacking style of the teacher's `server.rs`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, ApiState};
use crate::config::AppConfig;
use crate::detector::Detector;
use crate::embedder::{EmbedderClient, EmbedderHttpConfig, FixedEmbedder, HttpEmbedder};
use crate::explain::RuleBasedExplainer;
use crate::ingest::Ingestor;
use crate::pdf_ingest::{MinioObjectStore, ObjectStoreClient};
use crate::vectorstore::{HttpVectorStore, InMemoryVectorStore, VectorStoreClient, VectorStoreHttpConfig};

/// Whether to use in-memory fakes instead of live HTTP-backed
/// collaborators; mirrors the teacher's `UAR_TEST_MODE` escape hatch for
/// integration tests, generalized to a named env var.
fn use_fake_dependencies() -> bool {
    std::env::var("ENGINE_FAKE_DEPENDENCIES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let embedder: Arc<dyn EmbedderClient> = if use_fake_dependencies() {
        Arc::new(FixedEmbedder::new(config.embedder.dimensions))
    } else {
        Arc::new(HttpEmbedder::new(EmbedderHttpConfig {
            base_url: config.embedder.base_url.clone(),
            api_key: config.embedder.api_key.clone(),
            dimensions: config.embedder.dimensions,
            batch_size: config.embedder.batch_size,
            max_attempts: config.embedder.max_attempts,
            timeout: config.timeouts.embedder_call(),
        })?)
    };

    let vector_store: Arc<dyn VectorStoreClient> = if use_fake_dependencies() {
        Arc::new(InMemoryVectorStore::new())
    } else {
        Arc::new(HttpVectorStore::new(VectorStoreHttpConfig {
            base_url: config.vector_store.base_url.clone(),
            index_name: config.vector_store.index_name.clone(),
            api_key: config.vector_store.api_key.clone(),
            timeout: config.timeouts.knn_call(),
        })?)
    };
    vector_store.ensure_index(config.embedder.dimensions).await?;

    let object_store: Arc<dyn ObjectStoreClient> = Arc::new(MinioObjectStore::new(
        &config.pdf_ingest.object_store_endpoint,
        &config.pdf_ingest.object_store_region,
        &std::env::var("MINIO_ACCESS_KEY").unwrap_or_default(),
        &std::env::var("MINIO_SECRET_KEY").unwrap_or_default(),
    ));

    let explainer = Arc::new(RuleBasedExplainer);
    let detector = Detector::new(&config, embedder.clone(), vector_store.clone(), explainer);
    let chunker = crate::chunker::Chunker::new(crate::chunker::ChunkerConfig {
        chunk_size: config.chunking.chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        min_chunk_size: config.chunking.min_chunk_size,
    });
    let ingestor = Ingestor::new(chunker, embedder, vector_store);

    let state = Arc::new(ApiState {
        detector,
        ingestor,
        object_store,
        config: config.clone(),
    });

    let app: Router = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.check_request_secs)))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(%addr, "starting plagiarism detection engine");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
