//! Error taxonomy (§7). One narrow `thiserror` enum per external
//! collaborator, mirroring `uar::file_processing::provider::ProcessingError`
//! in spirit, plus the top-level `DetectorError` each of them converts into.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors from the embedder client (§4.2).
#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("embedder unreachable after retries: {0}")]
    Unavailable(String),
    #[error("embedder request timed out")]
    Timeout,
    #[error("embedder returned vector of length {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("embedder transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from the vector store client (§4.3).
#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("vector store unreachable after retries: {0}")]
    Unavailable(String),
    #[error("vector store request timed out")]
    Timeout,
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("vector store transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from the PDF ingest adapter (object fetch + extraction, §6).
#[derive(Debug, thiserror::Error)]
pub enum PdfExtractionError {
    #[error("object not found at {bucket}/{object_path}")]
    ObjectNotFound { bucket: String, object_path: String },
    #[error("object store error: {0}")]
    ObjectStore(String),
    #[error("failed to parse PDF: {0}")]
    Malformed(String),
    #[error("extracted text was empty after filtering")]
    EmptyAfterFiltering,
}

/// The taxonomy the RPC boundary maps to status codes (§7). These are
/// *kinds*, not a type hierarchy: each external collaborator error above
/// folds into one of these via `#[from]`.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EmbedderError> for DetectorError {
    fn from(err: EmbedderError) -> Self {
        match err {
            EmbedderError::Unavailable(msg) => DetectorError::Unavailable(msg),
            EmbedderError::Timeout => DetectorError::DeadlineExceeded,
            EmbedderError::DimensionMismatch { expected, got } => DetectorError::Internal(
                format!("embedder vector length {got} != expected {expected}"),
            ),
            EmbedderError::Transport(e) => DetectorError::Unavailable(e.to_string()),
        }
    }
}

impl From<VectorStoreError> for DetectorError {
    fn from(err: VectorStoreError) -> Self {
        match err {
            VectorStoreError::Unavailable(msg) => DetectorError::Unavailable(msg),
            VectorStoreError::Timeout => DetectorError::DeadlineExceeded,
            VectorStoreError::NotFound(id) => DetectorError::NotFound(id),
            VectorStoreError::Transport(e) => DetectorError::Unavailable(e.to_string()),
        }
    }
}

impl From<PdfExtractionError> for DetectorError {
    fn from(err: PdfExtractionError) -> Self {
        match err {
            PdfExtractionError::ObjectNotFound { bucket, object_path } => {
                DetectorError::NotFound(format!("{bucket}/{object_path}"))
            }
            PdfExtractionError::ObjectStore(msg) => DetectorError::Unavailable(msg),
            PdfExtractionError::Malformed(msg) => DetectorError::InvalidArgument(msg),
            PdfExtractionError::EmptyAfterFiltering => {
                DetectorError::InvalidArgument("PDF contained no usable text".to_string())
            }
        }
    }
}

impl DetectorError {
    fn status_code(&self) -> StatusCode {
        match self {
            DetectorError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DetectorError::NotFound(_) => StatusCode::NOT_FOUND,
            DetectorError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectorError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            DetectorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DetectorError::InvalidArgument(_) => "InvalidArgument",
            DetectorError::NotFound(_) => "NotFound",
            DetectorError::Unavailable(_) => "Unavailable",
            DetectorError::DeadlineExceeded => "DeadlineExceeded",
            DetectorError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for DetectorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}
