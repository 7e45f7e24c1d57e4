//! The full RPC surface as HTTP routes under `/v1/...` (§6), built with
//! the router-and-typed-state shape of `uar::api::knowledge::build_router`.

mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::AppConfig;
use crate::detector::Detector;
use crate::ingest::Ingestor;
use crate::pdf_ingest::ObjectStoreClient;

pub struct ApiState {
    pub detector: Detector,
    pub ingestor: Ingestor,
    pub object_store: Arc<dyn ObjectStoreClient>,
    pub config: AppConfig,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState").finish_non_exhaustive()
    }
}

pub fn build_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/v1/check", post(handlers::check_plagiarism))
        .route("/v1/documents", post(handlers::upload_document))
        .route("/v1/documents", get(handlers::search_documents))
        .route("/v1/documents/batch", post(handlers::batch_upload))
        .route(
            "/v1/documents/{id}",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route("/v1/pdf/index", post(handlers::index_pdf_from_minio))
        .route("/v1/pdf/check", post(handlers::check_pdf_from_minio))
        .route("/v1/health", get(handlers::health_check))
}
