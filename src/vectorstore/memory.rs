//! In-memory vector store used by tests and by the fully-fake dependency
//! container (no live Elasticsearch/OpenSearch-compatible cluster needed
//! to run the §8 end-to-end scenarios).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{post_process, KnnHit, KnnQuery, VectorStoreClient};
use crate::domain::{Chunk, Document};
use crate::error::VectorStoreError;

#[derive(Debug, Default)]
struct Indexed {
    document: Document,
    chunks: Vec<Chunk>,
}

#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: RwLock<HashMap<String, Indexed>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)) as f64
    }
}

#[async_trait]
impl VectorStoreClient for InMemoryVectorStore {
    async fn ensure_index(&self, _dimensions: usize) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn upsert(&self, document: &Document, chunks: &[Chunk]) -> Result<(), VectorStoreError> {
        let mut guard = self.documents.write().expect("vector store lock poisoned");
        let mut document = document.clone();
        document.chunk_count = chunks.len();
        guard.insert(
            document.id.clone(),
            Indexed {
                document,
                chunks: chunks.to_vec(),
            },
        );
        Ok(())
    }

    async fn delete(&self, doc_id: &str) -> Result<bool, VectorStoreError> {
        let mut guard = self.documents.write().expect("vector store lock poisoned");
        Ok(guard.remove(doc_id).is_some())
    }

    async fn get(&self, doc_id: &str) -> Result<Option<Document>, VectorStoreError> {
        let guard = self.documents.read().expect("vector store lock poisoned");
        Ok(guard.get(doc_id).map(|i| i.document.clone()))
    }

    async fn search(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Document>, usize), VectorStoreError> {
        let guard = self.documents.read().expect("vector store lock poisoned");
        let mut matches: Vec<Document> = guard
            .values()
            .filter(|indexed| match query {
                Some(q) if !q.is_empty() => {
                    let needle = q.to_lowercase();
                    indexed.document.title.to_lowercase().contains(&needle)
                        || indexed.document.content.to_lowercase().contains(&needle)
                }
                _ => true,
            })
            .map(|indexed| indexed.document.clone())
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let total = matches.len();
        let page = matches.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn knn(&self, query: &KnnQuery) -> Result<Vec<KnnHit>, VectorStoreError> {
        let guard = self.documents.read().expect("vector store lock poisoned");
        let num_candidates = query.num_candidates();

        let mut raw: Vec<KnnHit> = guard
            .values()
            .filter(|indexed| !query.exclude_docs.contains(&indexed.document.id))
            .flat_map(|indexed| {
                indexed.chunks.iter().filter_map(move |chunk| {
                    let embedding = chunk.embedding.as_ref()?;
                    Some(KnnHit {
                        doc_id: indexed.document.id.clone(),
                        doc_title: indexed.document.title.clone(),
                        chunk_id: chunk.id.clone(),
                        chunk_text: chunk.text.clone(),
                        score: cosine(&query.vector, embedding),
                    })
                })
            })
            .collect();

        raw.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        raw.truncate(num_candidates);

        Ok(post_process(raw, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn doc_with_chunk(id: &str, title: &str, vector: Vec<f32>) -> (Document, Vec<Chunk>) {
        let mut document = Document::new(title.to_string(), "content".to_string(), None, Map::new());
        document.id = id.to_string();
        let chunk = Chunk {
            id: Chunk::id_for(id, 0),
            doc_id: id.to_string(),
            text: "matched text".to_string(),
            position: 0,
            word_count: 2,
            embedding: Some(vector),
        };
        (document, vec![chunk])
    }

    #[tokio::test]
    async fn knn_excludes_deleted_document() {
        let store = InMemoryVectorStore::new();
        let (doc, chunks) = doc_with_chunk("doc-1", "Doc One", vec![1.0, 0.0]);
        store.upsert(&doc, &chunks).await.unwrap();
        store.delete("doc-1").await.unwrap();

        let query = KnnQuery {
            vector: vec![1.0, 0.0],
            k: 10,
            exclude_docs: vec![],
            min_score: 0.0,
            max_results_per_source: 3,
        };
        let hits = store.knn(&query).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn knn_excludes_docs_in_exclude_list() {
        let store = InMemoryVectorStore::new();
        let (doc, chunks) = doc_with_chunk("doc-1", "Doc One", vec![1.0, 0.0]);
        store.upsert(&doc, &chunks).await.unwrap();

        let query = KnnQuery {
            vector: vec![1.0, 0.0],
            k: 10,
            exclude_docs: vec!["doc-1".to_string()],
            min_score: 0.0,
            max_results_per_source: 3,
        };
        let hits = store.knn(&query).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn knn_drops_hits_below_min_score() {
        let store = InMemoryVectorStore::new();
        let (doc, chunks) = doc_with_chunk("doc-1", "Doc One", vec![0.0, 1.0]);
        store.upsert(&doc, &chunks).await.unwrap();

        let query = KnnQuery {
            vector: vec![1.0, 0.0],
            k: 10,
            exclude_docs: vec![],
            min_score: 0.5,
            max_results_per_source: 3,
        };
        let hits = store.knn(&query).await.unwrap();
        assert!(hits.is_empty());
    }
}
