//! C7: orchestrates C1→C2→C3→C4→C5→C6 for one `CheckPlagiarism` call and
//! computes the final percentage/severity (§4.7).

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::aggregator::{self, AggregatorConfig};
use crate::chunker::Chunker;
use crate::config::AppConfig;
use crate::domain::{
    CandidateMatch, CheckOptions, Chunk, ChunkAnalysis, ProcessingMetrics, Severity,
    SimilarityThresholds, Verdict,
};
use crate::embedder::EmbedderClient;
use crate::error::DetectorError;
use crate::explain::NarrativeExplainer;
use crate::vectorstore::{KnnQuery, VectorStoreClient};

pub struct Detector {
    chunker: Chunker,
    embedder: Arc<dyn EmbedderClient>,
    vector_store: Arc<dyn VectorStoreClient>,
    explainer: Arc<dyn NarrativeExplainer>,
    aggregator_config: AggregatorConfig,
    thresholds: SimilarityThresholds,
    max_parallel_searches: usize,
    embedder_timeout: std::time::Duration,
    knn_timeout: std::time::Duration,
    check_timeout: std::time::Duration,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("max_parallel_searches", &self.max_parallel_searches)
            .finish_non_exhaustive()
    }
}

impl Detector {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbedderClient>,
        vector_store: Arc<dyn VectorStoreClient>,
        explainer: Arc<dyn NarrativeExplainer>,
    ) -> Self {
        let chunker = Chunker::new(crate::chunker::ChunkerConfig {
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            min_chunk_size: config.chunking.min_chunk_size,
        });
        let thresholds = SimilarityThresholds {
            low: config.thresholds.similarity_low,
            medium: config.thresholds.similarity_medium,
            high: config.thresholds.similarity_high,
            critical: config.thresholds.similarity_critical,
        };
        Self {
            chunker,
            embedder,
            vector_store,
            explainer,
            aggregator_config: AggregatorConfig {
                similarity_low: config.thresholds.similarity_low,
                max_results_per_source: config.retrieval.max_results_per_source,
            },
            thresholds,
            max_parallel_searches: config.retrieval.max_parallel_searches.max(1),
            embedder_timeout: config.timeouts.embedder_call(),
            knn_timeout: config.timeouts.knn_call(),
            check_timeout: config.timeouts.check_request(),
        }
    }

    /// Run one `CheckPlagiarism` request end to end, under the request-level
    /// deadline (§5).
    #[instrument(skip(self, text, options), fields(request_id))]
    pub async fn check(&self, text: &str, options: CheckOptions) -> Result<Verdict, DetectorError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if text.trim().is_empty() {
            return Ok(self.empty_verdict(request_id));
        }

        timeout(self.check_timeout, self.check_inner(text, options, request_id.clone()))
            .await
            .map_err(|_| DetectorError::DeadlineExceeded)?
    }

    async fn check_inner(
        &self,
        text: &str,
        options: CheckOptions,
        request_id: String,
    ) -> Result<Verdict, DetectorError> {
        let start = Instant::now();
        let min_similarity = options.min_similarity.unwrap_or(self.thresholds.low);

        // C1: chunk.
        let chunks = self.chunker.chunk("__input__", text);
        if chunks.is_empty() {
            return Ok(self.empty_verdict(request_id));
        }

        // C2: embed all chunks in one batched call.
        let embed_start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = timeout(self.embedder_timeout, self.embedder.embed(&texts))
            .await
            .map_err(|_| DetectorError::DeadlineExceeded)??;
        let embed_duration_ms = embed_start.elapsed().as_millis() as u64;

        // C3: bounded-parallel kNN, one query per chunk.
        let search_start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel_searches));
        let mut tasks = Vec::with_capacity(chunks.len());
        for (index, vector) in vectors.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let vector_store = self.vector_store.clone();
            let query = KnnQuery {
                vector,
                k: options.top_k,
                exclude_docs: options.exclude_docs.clone(),
                min_score: min_similarity,
                max_results_per_source: self.aggregator_config.max_results_per_source,
            };
            let knn_timeout = self.knn_timeout;
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed while detector is alive");
                let hits = timeout(knn_timeout, vector_store.knn(&query))
                    .await
                    .map_err(|_| DetectorError::DeadlineExceeded)?
                    .map_err(DetectorError::from)?;
                Ok::<_, DetectorError>((index, hits))
            }));
        }

        // Ordering guarantee (§5): responses are keyed by chunk_index and
        // re-sorted below, independent of completion order.
        let mut hits_by_index = vec![Vec::new(); chunks.len()];
        for task in tasks {
            let (index, hits) = task
                .await
                .map_err(|e| DetectorError::Internal(format!("search task panicked: {e}")))??;
            hits_by_index[index] = hits;
        }
        let search_duration_ms = search_start.elapsed().as_millis() as u64;

        // C4+C5+C6: lexical rescoring, citation penalty, per-chunk aggregation.
        let mut per_chunk_candidates: Vec<Vec<CandidateMatch>> = Vec::with_capacity(chunks.len());
        let mut chunk_analyses = Vec::with_capacity(chunks.len());
        let mut numer = 0.0f64;
        let mut denom = 0.0f64;

        for (chunk, hits) in chunks.iter().zip(hits_by_index.into_iter()) {
            let candidates = aggregator::aggregate_chunk(&chunk.text, chunk.position, hits, &self.aggregator_config);

            let max_combined = candidates.iter().map(|c| c.combined_score).fold(0.0, f64::max);
            let best_match_doc_id = candidates
                .iter()
                .max_by(|a, b| {
                    a.combined_score
                        .partial_cmp(&b.combined_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|c| c.doc_id.clone());

            denom += chunk.word_count as f64;
            if max_combined >= min_similarity {
                numer += chunk.word_count as f64 * max_combined;
            }

            chunk_analyses.push(ChunkAnalysis {
                chunk_index: chunk.position,
                text: chunk.text.clone(),
                max_combined_similarity: max_combined,
                severity: Severity::band(max_combined * 100.0, &self.thresholds),
                best_match_doc_id,
            });

            per_chunk_candidates.push(candidates);
        }

        let percentage = if denom > 0.0 { 100.0 * numer / denom } else { 0.0 };
        let severity = Severity::band(percentage, &self.thresholds);
        let matches = aggregator::global_matches(per_chunk_candidates, options.top_k);

        let explanation = if options.include_ai_analysis {
            self.explainer.explain(percentage, severity, &matches).await
        } else {
            crate::explain::rule_based_explanation(percentage, severity, matches.len())
        };

        let metrics = ProcessingMetrics {
            request_id: request_id.clone(),
            chunk_count: chunks.len(),
            candidate_count: matches.len(),
            embed_duration_ms,
            search_duration_ms,
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            request_id = %request_id,
            percentage,
            severity = ?severity,
            chunk_count = chunks.len(),
            "plagiarism check complete"
        );

        Ok(Verdict {
            percentage,
            severity,
            matches,
            chunk_analyses,
            explanation,
            metrics,
        })
    }

    fn empty_verdict(&self, request_id: String) -> Verdict {
        Verdict {
            percentage: 0.0,
            severity: Severity::Safe,
            matches: Vec::new(),
            chunk_analyses: Vec::new(),
            explanation: crate::explain::rule_based_explanation(0.0, Severity::Safe, 0),
            metrics: ProcessingMetrics {
                request_id,
                ..Default::default()
            },
        }
    }

}
