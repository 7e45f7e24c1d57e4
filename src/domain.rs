//! Core data model shared by the chunker, detector, aggregator, and ingestor.
//!
//! These types carry no behaviour of their own beyond small constructors; the
//! pipeline stages (`chunker`, `lexical`, `aggregator`, `detector`) own the
//! logic that produces and consumes them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A previously-ingested document held by the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: String,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub chunk_count: usize,
}

impl Document {
    pub fn new(
        title: String,
        content: String,
        language: Option<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            language: language.unwrap_or_else(|| "auto".to_string()),
            metadata,
            created_at: Utc::now(),
            chunk_count: 0,
        }
    }
}

/// One overlapping word-window of a document, produced by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub text: String,
    pub position: usize,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn id_for(doc_id: &str, position: usize) -> String {
        format!("{doc_id}#{position}")
    }
}

/// Severity band derived from a plagiarism percentage (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Bands the given percentage per the thresholds in §4.7, lower bound
    /// inclusive. `thresholds` is `(low, medium, high, critical)`.
    pub fn band(percentage: f64, thresholds: &SimilarityThresholds) -> Self {
        if percentage >= thresholds.critical * 100.0 {
            Severity::Critical
        } else if percentage >= thresholds.high * 100.0 {
            Severity::High
        } else if percentage >= thresholds.medium * 100.0 {
            Severity::Medium
        } else if percentage >= thresholds.low * 100.0 {
            Severity::Low
        } else {
            Severity::Safe
        }
    }
}

/// The four similarity-band boundaries, configurable but defaulting to
/// the values named in §6.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            low: 0.50,
            medium: 0.70,
            high: 0.85,
            critical: 0.95,
        }
    }
}

/// A single source candidate surfaced for one input chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub doc_id: String,
    pub doc_title: String,
    pub matched_chunk_id: String,
    pub matched_chunk_text: String,
    pub input_chunk_text: String,
    pub input_position: usize,
    pub semantic_score: f64,
    pub lexical_score: f64,
    pub combined_score: f64,
}

/// Per-chunk rollup reported back to the caller alongside the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkAnalysis {
    pub chunk_index: usize,
    pub text: String,
    pub max_combined_similarity: f64,
    pub severity: Severity,
    pub best_match_doc_id: Option<String>,
}

/// Aggregate processing metrics attached to every verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub request_id: String,
    pub chunk_count: usize,
    pub candidate_count: usize,
    pub embed_duration_ms: u64,
    pub search_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The final result of a `CheckPlagiarism` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub percentage: f64,
    pub severity: Severity,
    pub matches: Vec<CandidateMatch>,
    pub chunk_analyses: Vec<ChunkAnalysis>,
    pub explanation: String,
    pub metrics: ProcessingMetrics,
}

/// Caller-supplied options for a `CheckPlagiarism` call (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct CheckOptions {
    pub min_similarity: Option<f64>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_true")]
    pub include_ai_analysis: bool,
    #[serde(default)]
    pub exclude_docs: Vec<String>,
}

fn default_top_k() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            min_similarity: None,
            top_k: default_top_k(),
            include_ai_analysis: true,
            exclude_docs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bands_use_inclusive_lower_bounds() {
        let t = SimilarityThresholds::default();
        assert_eq!(Severity::band(95.0, &t), Severity::Critical);
        assert_eq!(Severity::band(85.0, &t), Severity::High);
        assert_eq!(Severity::band(70.0, &t), Severity::Medium);
        assert_eq!(Severity::band(50.0, &t), Severity::Low);
        assert_eq!(Severity::band(49.9, &t), Severity::Safe);
    }

    #[test]
    fn chunk_id_matches_doc_id_hash_position_convention() {
        assert_eq!(Chunk::id_for("doc-1", 3), "doc-1#3");
    }
}
