//! Source-file loaders producing normalized documents.
//!
//! Dispatch is by extension: plain text becomes a single document, a
//! JSON array becomes one document per element. JSON arrays that match
//! the production maane record shape get searchable text assembled from
//! the record fields; anything else is indexed as a pretty-printed
//! re-serialization of the element. Unsupported types and parse failures
//! log and yield an empty set, which the orchestrator treats as "no
//! documents usable".

use std::path::Path;

use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::document::{Document, MaaneRecord, PopulationClassifier, meta};

/// Loads a source file into documents.
pub async fn load_documents(
    path: impl AsRef<Path>,
    classifier: PopulationClassifier,
) -> Vec<Document> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let documents = match extension.as_deref() {
        Some("txt") => load_text(path).await,
        Some("json") => load_json(path, classifier).await,
        _ => {
            warn!(path = %path.display(), "unsupported source file type");
            Vec::new()
        }
    };
    if !documents.is_empty() {
        info!(count = documents.len(), path = %path.display(), "loaded documents");
    }
    documents
}

async fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read source file");
            None
        }
    }
}

async fn load_text(path: &Path) -> Vec<Document> {
    let Some(content) = read_source(path).await else {
        return Vec::new();
    };
    let document = Document::new(content)
        .with_meta(meta::SOURCE, path.to_string_lossy().into_owned())
        .with_meta(meta::TYPE, "text");
    vec![document]
}

async fn load_json(path: &Path, classifier: PopulationClassifier) -> Vec<Document> {
    let Some(raw) = read_source(path).await else {
        return Vec::new();
    };
    let source = path.to_string_lossy().into_owned();

    // The production record shape first; arbitrary arrays as a fallback.
    if let Ok(records) = serde_json::from_str::<Vec<MaaneRecord>>(&raw) {
        return maane_documents(records, &source, classifier);
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(elements)) => array_documents(elements, &source, classifier),
        Ok(_) => {
            warn!(path = %path.display(), "expected a JSON array of records");
            Vec::new()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse JSON source");
            Vec::new()
        }
    }
}

fn maane_documents(
    records: Vec<MaaneRecord>,
    source: &str,
    classifier: PopulationClassifier,
) -> Vec<Document> {
    debug!(count = records.len(), "parsed maane records");
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Document::new(record.searchable_text())
                .with_meta(meta::CODE_MAANE, record.code_text())
                .with_meta(meta::NAME_MAANE, record.name.clone())
                .with_meta(meta::BUDGETS, record.budget_lines())
                .with_meta(meta::SOURCE, source.to_string())
                .with_meta(meta::TYPE, "json")
                .with_meta(meta::INDEX, index)
                .with_meta(meta::POPULATION, classifier(index).as_str())
        })
        .collect()
}

fn array_documents(
    elements: Vec<Value>,
    source: &str,
    classifier: PopulationClassifier,
) -> Vec<Document> {
    let mut documents = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let Ok(content) = serde_json::to_string_pretty(element) else {
            warn!(index, "skipping unserializable record");
            continue;
        };
        documents.push(
            Document::new(content)
                .with_meta(meta::SOURCE, source.to_string())
                .with_meta(meta::TYPE, "json")
                .with_meta(meta::INDEX, index)
                .with_meta(meta::POPULATION, classifier(index).as_str()),
        );
    }
    documents
}
