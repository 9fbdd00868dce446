//! Shared test helpers: an in-process mock of the REST backend.

#![allow(dead_code)]

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": "2026-10-16T09:30:00",
        "checks": {
            "chromadb": "connected",
            "ollama": "connected, models: 2",
            "redis": "connected",
            "database": "connected"
        }
    }))
}

async fn search(Json(body): Json<Value>) -> Response {
    let query = body["query"].as_str().unwrap_or("");
    if query.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Query is required"})))
            .into_response();
    }
    let limit = body["limit"].as_u64().unwrap_or(5) as usize;
    let results: Vec<Value> = (0..limit.min(3))
        .map(|i| {
            json!({
                "content": format!("Passage {} about {}", i + 1, query),
                "metadata": {"filename": format!("doc{}.pdf", i + 1)},
                "score": 0.9 - (i as f64) * 0.1
            })
        })
        .collect();
    let count = results.len();
    Json(json!({"query": query, "results": results, "count": count})).into_response()
}

async fn ask(Json(body): Json<Value>) -> Response {
    let question = body["question"].as_str().unwrap_or("");
    if question.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Question is required"})))
            .into_response();
    }
    if question.contains("explode") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "LLM host unreachable"})),
        )
            .into_response();
    }
    let use_context = body["use_context"].as_bool().unwrap_or(true);
    let sources = if use_context {
        json!([{"filename": "doc1.pdf", "source": "contracts"}])
    } else {
        json!([])
    };
    Json(json!({
        "question": question,
        "answer": "Clients pay net 30.",
        "sources": sources,
        "context_used": use_context
    }))
    .into_response()
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    let message = body["message"].as_str().unwrap_or("");
    Json(json!({"message": message, "response": format!("echo: {}", message)}))
}

async fn clients(Query(params): Query<HashMap<String, String>>) -> Response {
    let Some(q) = params.get("q").filter(|q| !q.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Query parameter 'q' is required"})),
        )
            .into_response();
    };
    if q.contains("nobody") {
        return Json(json!({"query": q, "results": [], "count": 0})).into_response();
    }
    Json(json!({
        "query": q,
        "results": [
            {
                "org_id": 17,
                "legal_name": format!("{} Holdings LLC", q),
                "dba_name": "Acme",
                "tax_id": "12-3456789",
                "org_type": "client"
            },
            {
                "org_id": 18,
                "legal_name": "Acme Builders Inc",
                "dba_name": null,
                "tax_id": null,
                "org_type": "construction"
            }
        ],
        "count": 2
    }))
    .into_response()
}

async fn documents() -> Json<Value> {
    Json(json!({"collection": "merger_documents", "document_count": 42}))
}

async fn ingest(Json(body): Json<Value>) -> Json<Value> {
    let id = body["id"].as_str().unwrap_or("doc-generated").to_string();
    Json(json!({
        "success": true,
        "id": id,
        "message": "Document ingested successfully"
    }))
}

async fn models() -> Json<Value> {
    Json(json!({
        "models": [
            {"name": "llama3.2:latest", "model": "llama3.2:latest", "size": 2019393189u64},
            {"name": "nomic-embed-text:latest", "model": "nomic-embed-text:latest"}
        ]
    }))
}

async fn down() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "backend down for maintenance"})),
    )
        .into_response()
}

fn healthy_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/search", post(search))
        .route("/api/v1/ask", post(ask))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/clients/search", get(clients))
        .route("/api/v1/documents", get(documents))
        .route("/api/v1/documents/ingest", post(ingest))
        .route("/api/v1/models", get(models))
}

async fn serve(router: Router) -> MockBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    MockBackend {
        base_url: format!("http://127.0.0.1:{}", port),
        handle,
    }
}

/// Mock backend where every endpoint behaves.
pub async fn spawn_mock() -> MockBackend {
    serve(healthy_router()).await
}

/// Mock backend where every endpoint answers 503.
pub async fn spawn_down() -> MockBackend {
    serve(Router::new().fallback(down)).await
}

/// An address nothing listens on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
