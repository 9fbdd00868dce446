//! `ApiClient` against an in-process mock backend.

mod common;

use merger_dashboard::api::{ApiClient, ApiError, Backend};
use merger_dashboard::config::ApiConfig;
use merger_dashboard::models::IngestDocument;
use serde_json::{Map, Value};

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: Some(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_health_report() {
    let mock = common::spawn_mock().await;
    let report = client(&mock.base_url).health().await.unwrap();

    assert!(report.is_healthy());
    assert_eq!(report.checks.len(), 4);
    assert!(report.service_connected("chromadb"));
    assert_eq!(report.checks["ollama"], "connected, models: 2");
    assert_eq!(report.timestamp.as_deref(), Some("2026-10-16T09:30:00"));
}

#[tokio::test]
async fn test_ask_returns_answer_and_citations() {
    let mock = common::spawn_mock().await;
    let api = client(&mock.base_url);

    let resp = api.ask("What are the payment terms?").await.unwrap();
    assert_eq!(resp.answer, "Clients pay net 30.");
    assert_eq!(resp.sources.len(), 1);
    assert_eq!(resp.sources[0].display_name(), "doc1.pdf");

    let resp = api
        .ask_with("What are the payment terms?", Some(false))
        .await
        .unwrap();
    assert!(resp.sources.is_empty());
}

#[tokio::test]
async fn test_backend_error_field_becomes_message() {
    let mock = common::spawn_mock().await;
    let err = client(&mock.base_url)
        .ask("please explode")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.path(), "/api/v1/ask");
    assert_eq!(err.to_string(), "/api/v1/ask returned 500: LLM host unreachable");
}

#[tokio::test]
async fn test_chat_reply() {
    let mock = common::spawn_mock().await;
    let reply = client(&mock.base_url).chat("hello").await.unwrap();
    assert_eq!(reply.response, "echo: hello");
}

#[tokio::test]
async fn test_client_search_encodes_query() {
    let mock = common::spawn_mock().await;
    let resp = client(&mock.base_url)
        .search_clients("Smith & Sons")
        .await
        .unwrap();

    assert_eq!(resp.query.as_deref(), Some("Smith & Sons"));
    assert_eq!(resp.results.len(), 2);
    assert_eq!(resp.results[0].legal_name, "Smith & Sons Holdings LLC");
    assert_eq!(resp.results[0].org_id.to_string(), "17");
    assert_eq!(resp.results[0].dba(), Some("Acme"));
    assert_eq!(resp.results[1].tax_id_display(), "N/A");
}

#[tokio::test]
async fn test_client_search_no_matches() {
    let mock = common::spawn_mock().await;
    let resp = client(&mock.base_url)
        .search_clients("nobody at all")
        .await
        .unwrap();
    assert!(resp.results.is_empty());
}

#[tokio::test]
async fn test_document_search_respects_limit() {
    let mock = common::spawn_mock().await;
    let api = client(&mock.base_url);

    let hits = api.search_documents("audit", 2).await.unwrap();
    assert_eq!(hits.results.len(), 2);
    assert_eq!(hits.results[0].display_name(), "doc1.pdf");
    assert!(hits.results[0].score > hits.results[1].score);

    let err = api.search_documents("", 2).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Query is required"));
}

#[tokio::test]
async fn test_document_stats_and_models() {
    let mock = common::spawn_mock().await;
    let api = client(&mock.base_url);

    let stats = api.document_stats().await.unwrap();
    assert_eq!(stats.document_count, 42);
    assert_eq!(stats.collection.as_deref(), Some("merger_documents"));

    let models = api.models().await.unwrap();
    assert_eq!(
        models.models,
        vec!["llama3.2:latest", "nomic-embed-text:latest"]
    );
}

#[tokio::test]
async fn test_ingest_document() {
    let mock = common::spawn_mock().await;
    let mut metadata = Map::new();
    metadata.insert("filename".to_string(), Value::String("terms.md".to_string()));

    let receipt = client(&mock.base_url)
        .ingest_document(&IngestDocument {
            content: "Invoices are due net 30.".to_string(),
            metadata,
            id: Some("terms-1".to_string()),
        })
        .await
        .unwrap();

    assert!(receipt.success);
    assert_eq!(receipt.id, "terms-1");
}

#[tokio::test]
async fn test_service_unavailable() {
    let mock = common::spawn_down().await;
    let err = client(&mock.base_url).health().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("backend down for maintenance"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let err = client(&common::dead_url()).health().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.status(), None);
}
