//! C3: index lifecycle, upsert/delete, and kNN search against the
//! embedding store (§4.3). Trait + multi-implementation shape grounded on
//! `uar::file_processing::provider::FileProcessor` /
//! `FileProcessorFactory`.

mod http;
mod memory;

pub use http::{HttpVectorStore, VectorStoreHttpConfig};
pub use memory::InMemoryVectorStore;

use async_trait::async_trait;

use crate::domain::{Chunk, Document};
use crate::error::VectorStoreError;

/// One kNN hit as returned by the vector store, already filtered/capped
/// per §4.3's post-processing rules.
#[derive(Debug, Clone)]
pub struct KnnHit {
    pub doc_id: String,
    pub doc_title: String,
    pub chunk_id: String,
    pub chunk_text: String,
    /// Raw cosine similarity in [-1,1]; callers treat negative as 0.
    pub score: f64,
}

/// Parameters for a single kNN query (§4.3).
#[derive(Debug, Clone)]
pub struct KnnQuery {
    pub vector: Vec<f32>,
    pub k: usize,
    pub exclude_docs: Vec<String>,
    pub min_score: f64,
    pub max_results_per_source: usize,
}

impl KnnQuery {
    /// `num_candidates = max(100, 10*k)`, per §4.3.
    pub fn num_candidates(&self) -> usize {
        (10 * self.k).max(100)
    }
}

#[async_trait]
pub trait VectorStoreClient: Send + Sync + std::fmt::Debug {
    /// Create or verify the index schema on startup (§4.3). Idempotent.
    async fn ensure_index(&self, dimensions: usize) -> Result<(), VectorStoreError>;

    /// Upsert a document with its already-embedded chunks as a unit — a
    /// reader must never observe a torn document (§5).
    async fn upsert(&self, document: &Document, chunks: &[Chunk]) -> Result<(), VectorStoreError>;

    async fn delete(&self, doc_id: &str) -> Result<bool, VectorStoreError>;

    async fn get(&self, doc_id: &str) -> Result<Option<Document>, VectorStoreError>;

    async fn search(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Document>, usize), VectorStoreError>;

    /// Execute one kNN query and return post-processed hits per §4.3:
    /// drop below `min_score`, cap per source, truncate to `k`, ordered
    /// by score descending.
    async fn knn(&self, query: &KnnQuery) -> Result<Vec<KnnHit>, VectorStoreError>;
}

/// Shared post-processing applied by every implementation after it
/// gathers `num_candidates` raw hits (§4.3): drop below `min_score`, cap
/// per source, truncate to `k`.
pub fn post_process(mut hits: Vec<KnnHit>, query: &KnnQuery) -> Vec<KnnHit> {
    hits.retain(|h| h.score.max(0.0) >= query.min_score);
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept_per_doc = std::collections::HashMap::new();
    hits.retain(|h| {
        let count = kept_per_doc.entry(h.doc_id.clone()).or_insert(0usize);
        if *count < query.max_results_per_source {
            *count += 1;
            true
        } else {
            false
        }
    });

    hits.truncate(query.k);
    hits
}
