//! HTTP client for the merger-integration backend.
//!
//! [`ApiClient`] is the single point of contact with the backend. It owns a
//! [`reqwest::Client`] with a fixed base URL and a JSON content type, and
//! exposes one method per endpoint. Page state managers and the shell never
//! talk to `ApiClient` directly; they go through the [`Backend`] trait so
//! tests can substitute an in-memory fake.
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `GET`  | `/health` | [`Backend::health`] |
//! | `POST` | `/api/v1/search` | [`Backend::search_documents`] |
//! | `POST` | `/api/v1/ask` | [`Backend::ask`] |
//! | `POST` | `/api/v1/chat` | [`Backend::chat`] |
//! | `GET`  | `/api/v1/clients/search?q=` | [`Backend::search_clients`] |
//! | `GET`  | `/api/v1/documents` | [`Backend::document_stats`] |
//! | `POST` | `/api/v1/documents/ingest` | [`Backend::ingest_document`] |
//! | `GET`  | `/api/v1/models` | [`Backend::models`] |
//!
//! # Failure model
//!
//! Network errors, timeouts, non-2xx statuses, and undecodable bodies all
//! surface as an [`ApiError`]. Nothing is retried.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::models::{
    AskRequest, AskResponse, ChatReply, ChatRequest, ClientSearchResponse, DocumentSearch,
    DocumentSearchRequest, DocumentStats, HealthReport, IngestDocument, IngestReceipt, ModelList,
};

/// A failed backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-2xx status.
    #[error("{path} returned {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    /// The response body was not the JSON we expected.
    #[error("invalid response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    pub fn path(&self) -> &str {
        match self {
            ApiError::Transport { path, .. }
            | ApiError::Status { path, .. }
            | ApiError::Decode { path, .. } => path,
        }
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The backend operations the UI depends on.
///
/// Implemented by [`ApiClient`] for real traffic and by in-memory fakes in
/// tests.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health(&self) -> Result<HealthReport, ApiError>;

    async fn search_documents(&self, query: &str, limit: usize)
        -> Result<DocumentSearch, ApiError>;

    /// Retrieval-augmented question answering.
    async fn ask(&self, question: &str) -> Result<AskResponse, ApiError> {
        self.ask_with(question, None).await
    }

    /// Like [`ask`](Backend::ask) with an explicit `use_context` flag.
    /// `None` leaves the backend's default (context on).
    async fn ask_with(
        &self,
        question: &str,
        use_context: Option<bool>,
    ) -> Result<AskResponse, ApiError>;

    /// Plain LLM chat without retrieval.
    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError>;

    async fn search_clients(&self, query: &str) -> Result<ClientSearchResponse, ApiError>;

    async fn document_stats(&self) -> Result<DocumentStats, ApiError>;

    async fn ingest_document(&self, doc: &IngestDocument) -> Result<IngestReceipt, ApiError>;

    async fn models(&self) -> Result<ModelList, ApiError>;
}

/// HTTP implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("mdash/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let mut req = self.http.get(self.url(path));
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        decode(path, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        decode(path, resp).await
    }
}

/// Turn a response into `T`, or an [`ApiError`] for non-2xx / bad JSON.
async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|source| ApiError::Transport {
        path: path.to_string(),
        source,
    })?;

    if !status.is_success() {
        let err = ApiError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            message: error_message(&body, status),
        };
        tracing::warn!(error = %err, "backend call failed");
        return Err(err);
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Pull the backend's `{"error": "..."}` message out of an error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("error").and_then(|e| e.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.get_json("/health", &[]).await
    }

    async fn search_documents(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<DocumentSearch, ApiError> {
        self.post_json("/api/v1/search", &DocumentSearchRequest { query, limit })
            .await
    }

    async fn ask_with(
        &self,
        question: &str,
        use_context: Option<bool>,
    ) -> Result<AskResponse, ApiError> {
        self.post_json(
            "/api/v1/ask",
            &AskRequest {
                question,
                use_context,
            },
        )
        .await
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        self.post_json("/api/v1/chat", &ChatRequest { message })
            .await
    }

    async fn search_clients(&self, query: &str) -> Result<ClientSearchResponse, ApiError> {
        self.get_json("/api/v1/clients/search", &[("q", query)])
            .await
    }

    async fn document_stats(&self) -> Result<DocumentStats, ApiError> {
        self.get_json("/api/v1/documents", &[]).await
    }

    async fn ingest_document(&self, doc: &IngestDocument) -> Result<IngestReceipt, ApiError> {
        self.post_json("/api/v1/documents/ingest", doc).await
    }

    async fn models(&self) -> Result<ModelList, ApiError> {
        self.get_json("/api/v1/models", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_backend_error_field() {
        let msg = error_message(
            r#"{"error": "Missing search query (q)"}"#,
            reqwest::StatusCode::BAD_REQUEST,
        );
        assert_eq!(msg, "Missing search query (q)");
    }

    #[test]
    fn error_message_falls_back_to_body_then_reason() {
        let msg = error_message("upstream exploded", reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(msg, "upstream exploded");

        let msg = error_message("", reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(msg, "Service Unavailable");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:5001/".to_string(),
            timeout_secs: Some(5),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.url("/health"), "http://localhost:5001/health");
    }

    #[test]
    fn status_error_display_carries_cause() {
        let err = ApiError::Status {
            path: "/api/v1/ask".to_string(),
            status: 500,
            message: "ollama unreachable".to_string(),
        };
        assert_eq!(err.to_string(), "/api/v1/ask returned 500: ollama unreachable");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.path(), "/api/v1/ask");
    }
}
