//! C8: chunk + embed + store a document (§4.8). Grounded on
//! `uar::rag::ingest::IngestService`'s shape (chunker + matcher +
//! persistence collaborators wired into one service), adapted to the
//! atomic-upload / per-document-batch-result contract in §4.8.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::chunker::Chunker;
use crate::domain::Document;
use crate::embedder::EmbedderClient;
use crate::error::DetectorError;
use crate::vectorstore::VectorStoreClient;

pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn EmbedderClient>,
    vector_store: Arc<dyn VectorStoreClient>,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor").finish_non_exhaustive()
    }
}

/// Result of one `UploadDocument` call (§6).
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub doc_id: String,
    pub chunks_created: usize,
    pub success: bool,
}

/// Result of one document inside a `BatchUpload` stream (§4.8/§6): failures
/// are recorded, not fatal to the rest of the stream.
#[derive(Debug, Clone)]
pub struct BatchIngestOutcome {
    pub title: String,
    pub report: Option<IngestReport>,
    pub error: Option<String>,
}

pub struct UploadRequest {
    pub title: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub language: Option<String>,
    pub doc_id: Option<String>,
}

impl Ingestor {
    pub fn new(chunker: Chunker, embedder: Arc<dyn EmbedderClient>, vector_store: Arc<dyn VectorStoreClient>) -> Self {
        Self {
            chunker,
            embedder,
            vector_store,
        }
    }

    /// `upload(title, content, metadata, language) -> {doc_id, chunk_count}`
    /// (§4.8). Fails atomically on vector-store error: no partial uploads.
    pub async fn upload(&self, request: UploadRequest) -> Result<IngestReport, DetectorError> {
        let mut document = Document::new(
            request.title,
            request.content.clone(),
            request.language,
            request.metadata,
        );
        if let Some(id) = request.doc_id {
            document.id = id;
        }

        let mut chunks = self.chunker.chunk(&document.id, &document.content);
        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            for (chunk, vector) in chunks.iter_mut().zip(vectors) {
                chunk.embedding = Some(vector);
            }
        }
        document.chunk_count = chunks.len();

        self.vector_store.upsert(&document, &chunks).await?;

        info!(doc_id = %document.id, chunk_count = chunks.len(), "document ingested");

        Ok(IngestReport {
            doc_id: document.id,
            chunks_created: chunks.len(),
            success: true,
        })
    }

    /// Batch ingest processes documents sequentially to keep memory
    /// bounded, but may batch multiple documents' chunks in one embedder
    /// call per document upload; reports per-document success/failure
    /// rather than aborting the stream (§4.8).
    pub async fn upload_batch(&self, requests: Vec<UploadRequest>) -> Vec<BatchIngestOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let title = request.title.clone();
            match self.upload(request).await {
                Ok(report) => outcomes.push(BatchIngestOutcome {
                    title,
                    report: Some(report),
                    error: None,
                }),
                Err(err) => {
                    warn!(title = %title, error = %err, "batch document ingest failed");
                    outcomes.push(BatchIngestOutcome {
                        title,
                        report: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        outcomes
    }

    pub async fn get(&self, doc_id: &str) -> Result<Option<Document>, DetectorError> {
        Ok(self.vector_store.get(doc_id).await?)
    }

    pub async fn delete(&self, doc_id: &str) -> Result<bool, DetectorError> {
        Ok(self.vector_store.delete(doc_id).await?)
    }

    pub async fn search(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Document>, usize), DetectorError> {
        Ok(self.vector_store.search(query, limit, offset).await?)
    }

    pub fn new_document_id() -> String {
        Uuid::new_v4().to_string()
    }
}
