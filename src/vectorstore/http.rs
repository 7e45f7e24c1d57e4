//! HTTP-backed vector store client, targeting an Elasticsearch/OpenSearch
//! -compatible dense-vector index matching the logical schema in §6.
//! Grounded on the request-building and status-mapping style of
//! `uar::file_processing::unstructured::UnstructuredProvider`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{post_process, KnnHit, KnnQuery, VectorStoreClient};
use crate::domain::{Chunk, Document};
use crate::error::VectorStoreError;

#[derive(Debug, Clone)]
pub struct VectorStoreHttpConfig {
    pub base_url: String,
    pub index_name: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for VectorStoreHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            index_name: "plagiarism-documents".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub struct HttpVectorStore {
    client: reqwest::Client,
    config: VectorStoreHttpConfig,
}

impl HttpVectorStore {
    pub fn new(config: VectorStoreHttpConfig) -> Result<Self, VectorStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.config.base_url, self.config.index_name, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct IndexedChunk<'a> {
    chunk_id: &'a str,
    text: &'a str,
    position: usize,
    embedding: &'a [f32],
}

#[derive(Serialize)]
struct IndexedDocument<'a> {
    document_id: &'a str,
    title: &'a str,
    content: &'a str,
    language: &'a str,
    metadata: &'a std::collections::HashMap<String, String>,
    created_at: chrono::DateTime<chrono::Utc>,
    chunks: Vec<IndexedChunk<'a>>,
}

#[derive(Deserialize)]
struct KnnResponseHit {
    doc_id: String,
    doc_title: String,
    chunk_id: String,
    chunk_text: String,
    score: f64,
}

#[derive(Deserialize)]
struct KnnResponse {
    hits: Vec<KnnResponseHit>,
}

#[async_trait]
impl VectorStoreClient for HttpVectorStore {
    async fn ensure_index(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        let body = json!({
            "mappings": {
                "properties": {
                    "document_id": {"type": "keyword"},
                    "title": {"type": "text"},
                    "content": {"type": "text"},
                    "language": {"type": "keyword"},
                    "metadata": {"type": "object"},
                    "created_at": {"type": "date"},
                    "chunks": {
                        "type": "nested",
                        "properties": {
                            "chunk_id": {"type": "keyword"},
                            "text": {"type": "text"},
                            "position": {"type": "integer"},
                            "embedding": {
                                "type": "dense_vector",
                                "dims": dimensions,
                                "similarity": "cosine"
                            }
                        }
                    }
                }
            }
        });

        let response = self
            .authed(self.client.put(self.url("")))
            .json(&body)
            .send()
            .await?;
        // A 400 with "resource_already_exists" is the idempotent case.
        if !response.status().is_success() && response.status().as_u16() != 400 {
            return Err(VectorStoreError::Unavailable(format!(
                "failed to ensure index: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn upsert(&self, document: &Document, chunks: &[Chunk]) -> Result<(), VectorStoreError> {
        let chunks: Result<Vec<IndexedChunk>, VectorStoreError> = chunks
            .iter()
            .map(|c| {
                let embedding = c.embedding.as_deref().ok_or_else(|| {
                    VectorStoreError::Unavailable(format!("chunk {} missing embedding", c.id))
                })?;
                Ok(IndexedChunk {
                    chunk_id: &c.id,
                    text: &c.text,
                    position: c.position,
                    embedding,
                })
            })
            .collect();

        let body = IndexedDocument {
            document_id: &document.id,
            title: &document.title,
            content: &document.content,
            language: &document.language,
            metadata: &document.metadata,
            created_at: document.created_at,
            chunks: chunks?,
        };

        let response = self
            .authed(self.client.put(self.url(&format!("/_doc/{}", document.id))))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "upsert failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, doc_id: &str) -> Result<bool, VectorStoreError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/_doc/{doc_id}"))))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn get(&self, doc_id: &str) -> Result<Option<Document>, VectorStoreError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/_doc/{doc_id}"))))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "get failed: {}",
                response.status()
            )));
        }
        let document: Document = response.json().await?;
        Ok(Some(document))
    }

    async fn search(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Document>, usize), VectorStoreError> {
        let body = json!({
            "from": offset,
            "size": limit,
            "query": match query {
                Some(q) if !q.is_empty() => json!({"multi_match": {"query": q, "fields": ["title", "content"]}}),
                _ => json!({"match_all": {}}),
            }
        });

        #[derive(Deserialize)]
        struct SearchResponse {
            documents: Vec<Document>,
            total: usize,
        }

        let response = self
            .authed(self.client.post(self.url("/_search")))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "search failed: {}",
                response.status()
            )));
        }
        let parsed: SearchResponse = response.json().await?;
        Ok((parsed.documents, parsed.total))
    }

    async fn knn(&self, query: &KnnQuery) -> Result<Vec<KnnHit>, VectorStoreError> {
        let body = json!({
            "knn": {
                "field": "chunks.embedding",
                "query_vector": query.vector,
                "k": query.num_candidates(),
                "num_candidates": query.num_candidates(),
            },
            "exclude_docs": query.exclude_docs,
        });

        let response = self
            .authed(self.client.post(self.url("/_knn_search")))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::Unavailable(format!(
                "knn search failed: {}",
                response.status()
            )));
        }

        let parsed: KnnResponse = response.json().await?;
        let raw: Vec<KnnHit> = parsed
            .hits
            .into_iter()
            .map(|h| KnnHit {
                doc_id: h.doc_id,
                doc_title: h.doc_title,
                chunk_id: h.chunk_id,
                chunk_text: h.chunk_text,
                score: h.score,
            })
            .collect();

        Ok(post_process(raw, query))
    }
}
