//! HTTP-backed embedder client. Grounded on
//! `uar::file_processing::unstructured::UnstructuredProvider`'s use of a
//! bare `reqwest::Client` plus explicit status/error mapping at each call
//! site, with retry/backoff layered on top (§4.2).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};

use super::EmbedderClient;
use crate::error::EmbedderError;

#[derive(Debug, Clone)]
pub struct EmbedderHttpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for EmbedderHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            api_key: None,
            dimensions: 768,
            batch_size: 32,
            max_attempts: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbedderHttpConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderHttpConfig) -> Result<Self, EmbedderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.config.timeout))
            .build();

        let mut attempt = 0u32;
        backoff::future::retry(backoff, || async {
            attempt += 1;
            match self.send_batch(batch).await {
                Ok(vectors) => Ok(vectors),
                Err(err) if attempt < self.config.max_attempts => {
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        })
        .await
        .map_err(|err| match err {
            backoff::Error::Permanent(e) | backoff::Error::Transient { err: e, .. } => {
                EmbedderError::Unavailable(e.to_string())
            }
        })
    }

    async fn send_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut request = self
            .client
            .post(format!("{}/embed", self.config.base_url))
            .json(&EmbedRequest { input: batch });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedderError::Unavailable(format!(
                "embedder returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response.json().await?;
        for vector in &parsed.embeddings {
            if vector.len() != self.config.dimensions {
                return Err(EmbedderError::DimensionMismatch {
                    expected: self.config.dimensions,
                    got: vector.len(),
                });
            }
        }
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbedderClient for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        // Deduplicate so the embedder is called once per unique text within
        // this request (§4.2), then fan the results back out in input order.
        let mut unique_index: HashMap<&str, usize> = HashMap::new();
        let mut unique_texts: Vec<String> = Vec::new();
        for text in texts {
            if !unique_index.contains_key(text.as_str()) {
                unique_index.insert(text.as_str(), unique_texts.len());
                unique_texts.push(text.clone());
            }
        }

        let mut unique_vectors: Vec<Vec<f32>> = Vec::with_capacity(unique_texts.len());
        for batch in unique_texts.chunks(self.config.batch_size) {
            let embedded = self.embed_batch(batch).await?;
            unique_vectors.extend(embedded);
        }

        Ok(texts
            .iter()
            .map(|text| unique_vectors[unique_index[text.as_str()]].clone())
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
