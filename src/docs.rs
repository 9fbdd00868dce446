//! Document index commands: vector search, collection stats, and ingest.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use crate::api::Backend;
use crate::config::Config;
use crate::models::IngestDocument;

/// `mdash docs search <query>`.
pub async fn run_search_documents(
    config: &Config,
    backend: &dyn Backend,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let limit = limit.unwrap_or(config.search.document_limit);
    let hits = backend.search_documents(query.trim(), limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, hit.score, hit.display_name());
        let snippet: String = hit.content.chars().take(240).collect();
        for line in snippet.lines() {
            println!("    {}", line);
        }
        if hit.content.chars().count() > 240 {
            println!("    ...");
        }
        println!();
    }
    Ok(())
}

/// `mdash docs stats`.
pub async fn run_document_stats(backend: &dyn Backend, json: bool) -> Result<()> {
    let stats = backend.document_stats().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!(
        "Collection:  {}",
        stats.collection.as_deref().unwrap_or("(default)")
    );
    println!("Documents:   {}", stats.document_count);
    Ok(())
}

/// Build an ingest payload from a text file. The file name becomes the
/// `filename` metadata so answers can cite it.
pub fn ingest_payload(path: &Path, id: Option<String>) -> Result<IngestDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    if content.trim().is_empty() {
        anyhow::bail!("document is empty: {}", path.display());
    }

    let mut metadata = Map::new();
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        metadata.insert("filename".to_string(), Value::String(name.to_string()));
    }
    metadata.insert(
        "source".to_string(),
        Value::String(path.display().to_string()),
    );

    Ok(IngestDocument {
        content,
        metadata,
        id,
    })
}

/// `mdash docs ingest <file>`.
pub async fn run_ingest(
    backend: &dyn Backend,
    path: &Path,
    id: Option<String>,
    json: bool,
) -> Result<()> {
    let doc = ingest_payload(path, id)?;
    let receipt = backend.ingest_document(&doc).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }
    if !receipt.success {
        anyhow::bail!("ingest rejected: {}", receipt.message);
    }
    println!("ingested {} ({})", path.display(), receipt.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn payload_records_filename_and_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("payment-terms.md");
        std::fs::write(&path, "Invoices are due net 30.").unwrap();

        let doc = ingest_payload(&path, Some("terms-1".to_string())).unwrap();
        assert_eq!(doc.content, "Invoices are due net 30.");
        assert_eq!(doc.metadata["filename"], "payment-terms.md");
        assert_eq!(doc.id.as_deref(), Some("terms-1"));
    }

    #[test]
    fn empty_document_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blank.txt");
        std::fs::write(&path, "  \n").unwrap();
        assert!(ingest_payload(&path, None).is_err());
    }

    #[test]
    fn missing_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = ingest_payload(&tmp.path().join("nope.txt"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }
}
