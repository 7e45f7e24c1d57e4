//! Integration tests for the document corpus lifecycle: ingest, search,
//! and plagiarism checks against the in-memory collaborators end to end.

use std::collections::HashMap;
use std::sync::Arc;

use plagiarism_detector::chunker::{Chunker, ChunkerConfig};
use plagiarism_detector::config::AppConfig;
use plagiarism_detector::detector::Detector;
use plagiarism_detector::domain::{CheckOptions, Severity};
use plagiarism_detector::embedder::{EmbedderClient, FixedEmbedder};
use plagiarism_detector::explain::RuleBasedExplainer;
use plagiarism_detector::ingest::{Ingestor, UploadRequest};
use plagiarism_detector::vectorstore::{InMemoryVectorStore, VectorStoreClient};

fn lorem_words(n: usize) -> String {
    const WORDS: &[&str] = &[
        "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "while", "sentences",
        "continue", "forming",
    ];
    (0..n).map(|i| WORDS[i % WORDS.len()]).collect::<Vec<_>>().join(" ")
}

fn test_config() -> AppConfig {
    AppConfig::load_from_args(vec!["app".to_string()]).unwrap()
}

struct Harness {
    detector: Detector,
    ingestor: Ingestor,
}

fn build_harness() -> Harness {
    let config = test_config();
    let embedder = Arc::new(FixedEmbedder::new(config.embedder.dimensions));
    let vector_store = Arc::new(InMemoryVectorStore::new());
    let explainer = Arc::new(RuleBasedExplainer);

    let detector = Detector::new(
        &config,
        embedder.clone() as Arc<dyn EmbedderClient>,
        vector_store.clone() as Arc<dyn VectorStoreClient>,
        explainer,
    );
    let chunker = Chunker::new(ChunkerConfig {
        chunk_size: config.chunking.chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        min_chunk_size: config.chunking.min_chunk_size,
    });
    let ingestor = Ingestor::new(chunker, embedder, vector_store);
    Harness { detector, ingestor }
}

#[tokio::test]
async fn ingested_document_is_found_by_search() {
    let harness = build_harness();
    let report = harness
        .ingestor
        .upload(UploadRequest {
            title: "Climate Policy Overview".to_string(),
            content: lorem_words(80),
            metadata: HashMap::new(),
            language: Some("en".to_string()),
            doc_id: None,
        })
        .await
        .unwrap();

    let (docs, total) = harness.ingestor.search(Some("Climate"), 10, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(docs[0].id, report.doc_id);
}

#[tokio::test]
async fn checking_text_against_previously_ingested_corpus_flags_high_similarity() {
    let harness = build_harness();
    let content = lorem_words(120);

    harness
        .ingestor
        .upload(UploadRequest {
            title: "Source Document".to_string(),
            content: content.clone(),
            metadata: HashMap::new(),
            language: None,
            doc_id: None,
        })
        .await
        .unwrap();

    let verdict = harness.detector.check(&content, CheckOptions::default()).await.unwrap();
    assert!(verdict.percentage > 50.0, "expected elevated score, got {}", verdict.percentage);
    assert!(matches!(
        verdict.severity,
        Severity::High | Severity::Critical
    ));
    assert!(!verdict.matches.is_empty());
}

#[tokio::test]
async fn checking_unrelated_text_against_corpus_stays_safe() {
    let harness = build_harness();
    harness
        .ingestor
        .upload(UploadRequest {
            title: "Source Document".to_string(),
            content: lorem_words(120),
            metadata: HashMap::new(),
            language: None,
            doc_id: None,
        })
        .await
        .unwrap();

    let unrelated = "Completely unrelated text about something else entirely, with different vocabulary throughout.".to_string();
    let verdict = harness.detector.check(&unrelated, CheckOptions::default()).await.unwrap();
    assert!(verdict.percentage < 50.0);
}

#[tokio::test]
async fn batch_ingest_then_individual_delete_removes_only_target() {
    let harness = build_harness();
    let outcomes = harness
        .ingestor
        .upload_batch(vec![
            UploadRequest {
                title: "Doc A".to_string(),
                content: lorem_words(50),
                metadata: HashMap::new(),
                language: None,
                doc_id: None,
            },
            UploadRequest {
                title: "Doc B".to_string(),
                content: lorem_words(50),
                metadata: HashMap::new(),
                language: None,
                doc_id: None,
            },
        ])
        .await;
    assert_eq!(outcomes.len(), 2);
    let doc_a_id = outcomes[0].report.as_ref().unwrap().doc_id.clone();
    let doc_b_id = outcomes[1].report.as_ref().unwrap().doc_id.clone();

    assert!(harness.ingestor.delete(&doc_a_id).await.unwrap());
    assert!(harness.ingestor.get(&doc_a_id).await.unwrap().is_none());
    assert!(harness.ingestor.get(&doc_b_id).await.unwrap().is_some());
}
