//! Route handlers for every RPC named in §6. Grounded on
//! `uar::api::knowledge`'s handler shape, generalized to return
//! `Result<Json<T>, DetectorError>` instead of raw `(StatusCode, String)`
//! tuples (§ "Error handling" in SPEC_FULL.md).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{CheckOptions, Document, Verdict};
use crate::error::DetectorError;
use crate::ingest::UploadRequest;
use crate::pdf_ingest;

use super::ApiState;

#[derive(Deserialize)]
pub struct CheckRequest {
    pub text: String,
    #[serde(default)]
    pub options: CheckOptions,
}

pub async fn check_plagiarism(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<Verdict>, DetectorError> {
    if request.text.trim().is_empty() {
        return Err(DetectorError::InvalidArgument("text must not be empty".to_string()));
    }
    let verdict = state.detector.check(&request.text, request.options).await?;
    Ok(Json(verdict))
}

#[derive(Deserialize)]
pub struct UploadDocumentRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct UploadDocumentResponse {
    pub doc_id: String,
    pub chunks_created: usize,
    pub success: bool,
}

pub async fn upload_document(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<UploadDocumentResponse>, DetectorError> {
    if request.title.trim().is_empty() || request.content.trim().is_empty() {
        return Err(DetectorError::InvalidArgument(
            "title and content must not be empty".to_string(),
        ));
    }
    let report = state
        .ingestor
        .upload(UploadRequest {
            title: request.title,
            content: request.content,
            metadata: request.metadata,
            language: request.language,
            doc_id: None,
        })
        .await?;
    Ok(Json(UploadDocumentResponse {
        doc_id: report.doc_id,
        chunks_created: report.chunks_created,
        success: report.success,
    }))
}

#[derive(Deserialize)]
pub struct BatchUploadRequest {
    pub uploads: Vec<UploadDocumentRequest>,
}

#[derive(Serialize)]
pub struct BatchUploadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchUploadResult>,
}

#[derive(Serialize)]
pub struct BatchUploadResult {
    pub title: String,
    pub doc_id: Option<String>,
    pub chunks_created: Option<usize>,
    pub error: Option<String>,
}

pub async fn batch_upload(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<BatchUploadRequest>,
) -> Result<Json<BatchUploadSummary>, DetectorError> {
    let requests: Vec<UploadRequest> = request
        .uploads
        .into_iter()
        .map(|u| UploadRequest {
            title: u.title,
            content: u.content,
            metadata: u.metadata,
            language: u.language,
            doc_id: None,
        })
        .collect();

    let outcomes = state.ingestor.upload_batch(requests).await;
    let succeeded = outcomes.iter().filter(|o| o.error.is_none()).count();
    let failed = outcomes.len() - succeeded;

    let results = outcomes
        .into_iter()
        .map(|o| BatchUploadResult {
            title: o.title,
            doc_id: o.report.as_ref().map(|r| r.doc_id.clone()),
            chunks_created: o.report.as_ref().map(|r| r.chunks_created),
            error: o.error,
        })
        .collect::<Vec<_>>();

    Ok(Json(BatchUploadSummary {
        total: results.len(),
        succeeded,
        failed,
        results,
    }))
}

#[derive(Deserialize)]
pub struct GetDocumentQuery {
    #[serde(default)]
    pub include_content: bool,
    #[serde(default)]
    pub include_chunks: bool,
}

pub async fn get_document(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<GetDocumentQuery>,
) -> Result<Json<Document>, DetectorError> {
    let mut document = state
        .ingestor
        .get(&id)
        .await?
        .ok_or_else(|| DetectorError::NotFound(id.clone()))?;

    if !query.include_content {
        document.content.clear();
    }
    let _ = query.include_chunks; // chunk bodies are not embedded in the Document type returned here.

    Ok(Json(document))
}

#[derive(Serialize)]
pub struct DeleteDocumentResponse {
    pub success: bool,
}

pub async fn delete_document(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>, DetectorError> {
    let success = state.ingestor.delete(&id).await?;
    Ok(Json(DeleteDocumentResponse { success }))
}

#[derive(Deserialize)]
pub struct SearchDocumentsQuery {
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
pub struct SearchDocumentsResponse {
    pub documents: Vec<Document>,
    pub total: usize,
}

pub async fn search_documents(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SearchDocumentsQuery>,
) -> Result<Json<SearchDocumentsResponse>, DetectorError> {
    let (documents, total) = state
        .ingestor
        .search(query.query.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(SearchDocumentsResponse { documents, total }))
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub latency_ms: u64,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct HealthCheckResponse {
    pub healthy: bool,
    pub components: HashMap<String, ComponentHealth>,
}

pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthCheckResponse> {
    let mut components = HashMap::new();

    let embedder_start = Instant::now();
    let embedder_result = state.detector_embedder_probe().await;
    components.insert(
        "embedder".to_string(),
        ComponentHealth {
            healthy: embedder_result.is_ok(),
            latency_ms: embedder_start.elapsed().as_millis() as u64,
            message: embedder_result.err(),
        },
    );

    let vector_store_start = Instant::now();
    let vector_store_result = state.ingestor.search(None, 1, 0).await;
    components.insert(
        "vector_store".to_string(),
        ComponentHealth {
            healthy: vector_store_result.is_ok(),
            latency_ms: vector_store_start.elapsed().as_millis() as u64,
            message: vector_store_result.err().map(|e| e.to_string()),
        },
    );

    let healthy = components.values().all(|c| c.healthy);
    Json(HealthCheckResponse { healthy, components })
}

#[derive(Deserialize)]
pub struct PdfFromMinioRequest {
    pub bucket: String,
    pub object_path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct IndexPdfResponse {
    pub doc_id: String,
    pub chunks_created: usize,
    pub success: bool,
    pub extracted_chars: usize,
}

pub async fn index_pdf_from_minio(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PdfFromMinioRequest>,
) -> Result<Json<IndexPdfResponse>, DetectorError> {
    let content = fetch_and_extract(&state, &request.bucket, &request.object_path).await?;
    let title = request
        .title
        .unwrap_or_else(|| request.object_path.clone());

    let report = state
        .ingestor
        .upload(UploadRequest {
            title,
            content: content.clone(),
            metadata: request.metadata,
            language: request.language,
            doc_id: None,
        })
        .await?;

    Ok(Json(IndexPdfResponse {
        doc_id: report.doc_id,
        chunks_created: report.chunks_created,
        success: report.success,
        extracted_chars: content.chars().count(),
    }))
}

#[derive(Deserialize)]
pub struct CheckPdfFromMinioRequest {
    pub bucket: String,
    pub object_path: String,
    #[serde(default)]
    pub options: CheckOptions,
}

#[derive(Serialize)]
pub struct CheckPdfResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub extracted_chars: usize,
}

pub async fn check_pdf_from_minio(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CheckPdfFromMinioRequest>,
) -> Result<Json<CheckPdfResponse>, DetectorError> {
    let content = fetch_and_extract(&state, &request.bucket, &request.object_path).await?;
    let verdict = state.detector.check(&content, request.options).await?;
    Ok(Json(CheckPdfResponse {
        verdict,
        extracted_chars: content.chars().count(),
    }))
}

async fn fetch_and_extract(state: &ApiState, bucket: &str, object_path: &str) -> Result<String, DetectorError> {
    let bytes = state.object_store.fetch(bucket, object_path).await?;
    let segments = pdf_ingest::extract_text(&bytes)?;
    let content = pdf_ingest::filter_segments(segments, state.config.pdf_ingest.min_segment_chars)?;
    Ok(content)
}

impl ApiState {
    async fn detector_embedder_probe(&self) -> Result<(), String> {
        self.detector
            .check("healthcheck probe text only", CheckOptions {
                top_k: 1,
                include_ai_analysis: false,
                ..Default::default()
            })
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
