//! C6: fuse semantic + lexical scores, apply the citation penalty, and
//! rank/diversify candidates per input chunk (§4.6).

use std::collections::HashMap;

use crate::citation;
use crate::domain::CandidateMatch;
use crate::lexical;
use crate::vectorstore::KnnHit;

/// Parameters controlling aggregation; defaults follow §6.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    pub similarity_low: f64,
    pub max_results_per_source: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            similarity_low: 0.50,
            max_results_per_source: 3,
        }
    }
}

/// Turns the raw kNN hits for one input chunk into ranked, penalised,
/// per-source-capped candidate matches (§4.6 steps 1-5).
pub fn aggregate_chunk(
    input_chunk_text: &str,
    input_position: usize,
    hits: Vec<KnnHit>,
    config: &AggregatorConfig,
) -> Vec<CandidateMatch> {
    let mut candidates: Vec<CandidateMatch> = hits
        .into_iter()
        .map(|hit| {
            let semantic_score = hit.score.max(0.0);
            let lexical_score = lexical::score(input_chunk_text, &hit.chunk_text);
            let raw_combined = 0.5 * semantic_score + 0.5 * lexical_score;
            let combined_score = citation::apply_penalty(raw_combined, input_chunk_text, &hit.doc_title);
            CandidateMatch {
                doc_id: hit.doc_id,
                doc_title: hit.doc_title,
                matched_chunk_id: hit.chunk_id,
                matched_chunk_text: hit.chunk_text,
                input_chunk_text: input_chunk_text.to_string(),
                input_position,
                semantic_score,
                lexical_score,
                combined_score,
            }
        })
        .filter(|c| c.combined_score >= config.similarity_low)
        .collect();

    cap_per_source(&mut candidates, config.max_results_per_source);
    rank(&mut candidates);
    candidates
}

/// Re-applies the per-source cap from §4.3 after lexical rescoring may have
/// reordered candidates (§4.6 step 4, and the note in §9 explaining why the
/// cap is intentionally applied twice).
fn cap_per_source(candidates: &mut Vec<CandidateMatch>, max_per_source: usize) {
    rank(candidates);
    let mut kept_per_doc: HashMap<String, usize> = HashMap::new();
    candidates.retain(|c| {
        let count = kept_per_doc.entry(c.doc_id.clone()).or_insert(0);
        if *count < max_per_source {
            *count += 1;
            true
        } else {
            false
        }
    });
}

/// Rank by `combined` desc; ties broken by higher semantic, then smaller
/// matched-chunk position (stable order, §4.6 step 5).
fn rank(candidates: &mut [CandidateMatch]) {
    candidates.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.semantic_score
                    .partial_cmp(&a.semantic_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| matched_position(a).cmp(&matched_position(b)))
    });
}

/// Extracts the numeric position suffix from a `<doc_id>#<position>` chunk
/// id for the tie-break rule; unparsable ids sort last.
fn matched_position(candidate: &CandidateMatch) -> usize {
    candidate
        .matched_chunk_id
        .rsplit('#')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(usize::MAX)
}

/// Global matches returned to the caller: union of per-chunk top
/// candidates, de-duplicated by `(doc_id, matched_chunk_id)` keeping the
/// highest-scoring occurrence, limited to `top_k` (§4.6).
pub fn global_matches(per_chunk: Vec<Vec<CandidateMatch>>, top_k: usize) -> Vec<CandidateMatch> {
    let mut best: HashMap<(String, String), CandidateMatch> = HashMap::new();
    for candidate in per_chunk.into_iter().flatten() {
        let key = (candidate.doc_id.clone(), candidate.matched_chunk_id.clone());
        best.entry(key)
            .and_modify(|existing| {
                if candidate.combined_score > existing.combined_score {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }
    let mut all: Vec<CandidateMatch> = best.into_values().collect();
    rank(&mut all);
    all.truncate(top_k);
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc_id: &str, chunk_idx: usize, score: f64, text: &str) -> KnnHit {
        KnnHit {
            doc_id: doc_id.to_string(),
            doc_title: doc_id.to_string(),
            chunk_id: format!("{doc_id}#{chunk_idx}"),
            chunk_text: text.to_string(),
            score,
        }
    }

    #[test]
    fn discards_candidates_below_similarity_low() {
        let config = AggregatorConfig::default();
        let hits = vec![hit("doc-a", 0, 0.1, "totally unrelated text here today")];
        let result = aggregate_chunk("some input chunk text", 0, hits, &config);
        assert!(result.is_empty());
    }

    #[test]
    fn caps_candidates_per_source() {
        let config = AggregatorConfig {
            similarity_low: 0.0,
            max_results_per_source: 1,
        };
        let hits = vec![
            hit("doc-a", 0, 0.9, "some matching text"),
            hit("doc-a", 1, 0.95, "some matching text"),
        ];
        let result = aggregate_chunk("some matching text", 0, hits, &config);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].matched_chunk_id, "doc-a#1");
    }

    #[test]
    fn global_matches_dedups_keeping_highest_score() {
        let candidate_low = CandidateMatch {
            doc_id: "doc-a".into(),
            doc_title: "Doc A".into(),
            matched_chunk_id: "doc-a#0".into(),
            matched_chunk_text: "x".into(),
            input_chunk_text: "x".into(),
            input_position: 0,
            semantic_score: 0.5,
            lexical_score: 0.5,
            combined_score: 0.5,
        };
        let mut candidate_high = candidate_low.clone();
        candidate_high.combined_score = 0.9;

        let result = global_matches(vec![vec![candidate_low], vec![candidate_high]], 10);
        assert_eq!(result.len(), 1);
        assert!((result[0].combined_score - 0.9).abs() < 1e-9);
    }
}
