//! Wire types for the backend REST API.
//!
//! Every response type is deliberately lenient: missing or `null` fields fall
//! back to empty values instead of failing the whole response. The backend
//! passes through vector-store metadata and database rows verbatim, so field
//! types are not guaranteed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Deserialize a sequence that may be absent or `null`.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a string that may be absent or `null`.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a JSON object that may be absent or `null`.
fn nullable_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a string field out of a JSON object, treating blanks as missing.
fn non_empty_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============ GET /health ============

/// Response of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Per-service status strings, e.g. `"chromadb" => "connected"`.
    #[serde(default, deserialize_with = "nullable_map")]
    pub checks: BTreeMap<String, String>,
}

fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    /// Whether the named service reports a connected state.
    pub fn service_connected(&self, service: &str) -> bool {
        self.checks
            .get(service)
            .map(|s| s.contains("connected"))
            .unwrap_or(false)
    }
}

// ============ POST /api/v1/search ============

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSearchRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
}

/// One hit from the document vector search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable_object")]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub score: f64,
}

impl DocumentHit {
    /// Name of the backing document, using the same fallback as citations.
    pub fn display_name(&self) -> String {
        Citation::from_metadata(&self.metadata).display_name().to_string()
    }
}

/// Response of `POST /api/v1/search`: either `{results: [...]}` or a bare array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentSearch {
    pub results: Vec<DocumentHit>,
}

impl<'de> Deserialize<'de> for DocumentSearch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Wrapped {
                #[serde(default, deserialize_with = "nullable_vec")]
                results: Vec<DocumentHit>,
            },
            Bare(Vec<DocumentHit>),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Wrapped { results } => DocumentSearch { results },
            Shape::Bare(results) => DocumentSearch { results },
        })
    }
}

// ============ POST /api/v1/ask ============

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_context: Option<bool>,
}

/// A source document backing an assistant answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Citation {
    pub filename: Option<String>,
    pub source: Option<String>,
}

impl From<Value> for Citation {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Citation::from_metadata(&map),
            Value::String(s) if !s.trim().is_empty() => Citation {
                filename: None,
                source: Some(s.trim().to_string()),
            },
            _ => Citation::default(),
        }
    }
}

impl Citation {
    pub fn from_metadata(map: &Map<String, Value>) -> Self {
        Citation {
            filename: non_empty_str(map, "filename"),
            source: non_empty_str(map, "source"),
        }
    }

    /// Display name: filename, then source identifier, then `"Document"`.
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .or(self.source.as_deref())
            .unwrap_or("Document")
    }
}

/// Response of `POST /api/v1/ask`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default, deserialize_with = "nullable_string")]
    pub answer: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub context_used: Option<bool>,
}

// ============ POST /api/v1/chat ============

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Response of `POST /api/v1/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, deserialize_with = "nullable_string")]
    pub response: String,
}

// ============ GET /api/v1/clients/search ============

/// Organization id as rendered; the backend may send a number or a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct OrgId(pub String);

impl From<Value> for OrgId {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => OrgId(s),
            Value::Null => OrgId(String::new()),
            other => OrgId(other.to_string()),
        }
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One organization row from the merged client database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default)]
    pub org_id: OrgId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub legal_name: String,
    #[serde(default)]
    pub dba_name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub org_type: String,
}

impl ClientRecord {
    /// "Doing business as" name, when present and non-blank.
    pub fn dba(&self) -> Option<&str> {
        self.dba_name.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Tax id or `"N/A"`.
    pub fn tax_id_display(&self) -> &str {
        self.tax_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("N/A")
    }
}

/// Response of `GET /api/v1/clients/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub results: Vec<ClientRecord>,
}

// ============ GET /api/v1/documents ============

/// Response of `GET /api/v1/documents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub document_count: u64,
}

// ============ POST /api/v1/documents/ingest ============

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestDocument {
    pub content: String,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub message: String,
}

// ============ GET /api/v1/models ============

/// Model identifiers reported by the backend.
///
/// Accepts Ollama's `{models: [{name, model, ...}]}` listing, a bare array of
/// strings, or a bare array of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelList {
    pub models: Vec<String>,
}

impl<'de> Deserialize<'de> for ModelList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let entries = match value {
            Value::Object(mut map) => match map.remove("models") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Value::Array(items) => items,
            _ => Vec::new(),
        };

        let models = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s),
                Value::Object(map) => {
                    non_empty_str(&map, "name").or_else(|| non_empty_str(&map, "model"))
                }
                _ => None,
            })
            .collect();

        Ok(ModelList { models })
    }
}
