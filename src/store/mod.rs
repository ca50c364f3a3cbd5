//! In-memory vector index with metadata filtering and cosine search.

pub mod persist;

pub use persist::IndexStore;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Chunk;
use crate::providers::EmbeddingProvider;
use crate::types::{RagError, RagResult};

/// One embedded chunk: the vector and the chunk it came from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorRecord {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// Equality constraints over chunk metadata. A chunk is eligible only
/// when every listed field matches exactly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataFilter {
    fields: Vec<(String, Value)>,
}

impl MetadataFilter {
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            fields: vec![(key.into(), value.into())],
        }
    }

    #[must_use]
    pub fn and(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, chunk: &Chunk) -> bool {
        self.fields
            .iter()
            .all(|(key, value)| chunk.metadata.get(key) == Some(value))
    }
}

/// A searchable set of embedded chunks. Built once per source snapshot
/// and shared read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorIndex {
    records: Vec<VectorRecord>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embeds every chunk and assembles the index. Refuses empty input
    /// so callers cannot silently build an index that matches nothing.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> RagResult<Self> {
        if chunks.is_empty() {
            return Err(RagError::EmptyInput);
        }
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Provider {
                provider: "embeddings",
                message: format!(
                    "expected {} vectors, got {}",
                    chunks.len(),
                    vectors.len()
                ),
            });
        }
        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        let records = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| VectorRecord { vector, chunk })
            .collect();
        Ok(Self {
            records,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Top-k eligible chunks by cosine similarity, best first. Ties keep
    /// insertion order, so results are deterministic for a fixed index.
    pub fn search(
        &self,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Vec<(Chunk, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.is_none_or(|f| f.matches(&record.chunk)))
            .map(|(i, record)| (i, cosine_similarity(query_vector, &record.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(i, score)| (self.records[i].chunk.clone(), score))
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
