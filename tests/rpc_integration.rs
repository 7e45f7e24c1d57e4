//! HTTP-level integration tests for the RPC surface (§6), exercised
//! through the real axum router wired to in-memory collaborators.

use std::sync::Arc;

use axum_test::TestServer;
use plagiarism_detector::api::{build_router, ApiState};
use plagiarism_detector::config::AppConfig;
use plagiarism_detector::detector::Detector;
use plagiarism_detector::chunker::{Chunker, ChunkerConfig};
use plagiarism_detector::embedder::{EmbedderClient, FixedEmbedder};
use plagiarism_detector::explain::RuleBasedExplainer;
use plagiarism_detector::ingest::Ingestor;
use plagiarism_detector::pdf_ingest::{MinioObjectStore, ObjectStoreClient};
use plagiarism_detector::vectorstore::{InMemoryVectorStore, VectorStoreClient};
use serde_json::json;

fn test_config() -> AppConfig {
    AppConfig::load_from_args(vec!["app".to_string()]).unwrap()
}

fn build_server() -> TestServer {
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
    let object_store: Arc<dyn ObjectStoreClient> = Arc::new(MinioObjectStore::new(
        &config.pdf_ingest.object_store_endpoint,
        &config.pdf_ingest.object_store_region,
        "test-access-key",
        "test-secret-key",
    ));

    let state = Arc::new(ApiState {
        detector,
        ingestor,
        object_store,
        config,
    });

    let app = build_router().with_state(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn health_check_reports_healthy_collaborators() {
    let server = build_server();
    let response = server.get("/v1/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["healthy"], json!(true));
}

#[tokio::test]
async fn upload_then_check_via_http_flags_duplicate_content() {
    let server = build_server();
    let content = (0..80).map(|i| format!("token{i}")).collect::<Vec<_>>().join(" ");

    let upload_response = server
        .post("/v1/documents")
        .json(&json!({
            "title": "Reference Essay",
            "content": content,
            "metadata": {},
        }))
        .await;
    upload_response.assert_status_ok();
    let upload_body: serde_json::Value = upload_response.json();
    assert!(upload_body["success"].as_bool().unwrap());

    let check_response = server
        .post("/v1/check")
        .json(&json!({ "text": content }))
        .await;
    check_response.assert_status_ok();
    let verdict: serde_json::Value = check_response.json();
    assert!(verdict["percentage"].as_f64().unwrap() > 50.0);
}

#[tokio::test]
async fn check_with_empty_text_is_rejected() {
    let server = build_server();
    let response = server.post("/v1/check").json(&json!({ "text": "" })).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn get_document_returns_not_found_for_unknown_id() {
    let server = build_server();
    let response = server.get("/v1/documents/does-not-exist").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn delete_then_get_document_round_trips_via_http() {
    let server = build_server();
    let upload_response = server
        .post("/v1/documents")
        .json(&json!({
            "title": "Doc",
            "content": "some document content that is long enough to chunk properly",
            "metadata": {},
        }))
        .await;
    let body: serde_json::Value = upload_response.json();
    let doc_id = body["doc_id"].as_str().unwrap().to_string();

    let delete_response = server.delete(&format!("/v1/documents/{doc_id}")).await;
    delete_response.assert_status_ok();
    let delete_body: serde_json::Value = delete_response.json();
    assert!(delete_body["success"].as_bool().unwrap());

    let get_response = server.get(&format!("/v1/documents/{doc_id}")).await;
    get_response.assert_status_not_found();
}

#[tokio::test]
async fn batch_upload_reports_summary_over_http() {
    let server = build_server();
    let response = server
        .post("/v1/documents/batch")
        .json(&json!({
            "uploads": [
                { "title": "Doc A", "content": "alpha beta gamma delta epsilon", "metadata": {} },
                { "title": "Doc B", "content": "zeta eta theta iota kappa", "metadata": {} },
            ]
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["succeeded"], json!(2));
}

