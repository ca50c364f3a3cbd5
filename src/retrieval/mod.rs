//! Query-time search over the vector index.
//!
//! Two strategies share one entry point. `Filtered` runs a metadata-
//! constrained search and falls back to an unfiltered one when the
//! constraint yields nothing (or fails), so a narrow filter can never
//! silence the whole corpus. `Hybrid` oversamples unfiltered and can
//! rerank the pool by blending vector similarity with lexical overlap.

pub mod keywords;

pub use keywords::{extract_keywords, relevance_score};

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::config::{RagConfig, RetrievalStrategy};
use crate::document::{Chunk, meta};
use crate::providers::EmbeddingProvider;
use crate::store::{MetadataFilter, VectorIndex};
use crate::types::{RagError, RagResult};

/// Hybrid search widens the candidate pool by this factor before rerank.
const OVERSAMPLE: usize = 4;
/// Candidates at or below this lexical relevance are dropped by rerank.
const RERANK_RELEVANCE_FLOOR: f32 = 0.3;
const RERANK_VECTOR_WEIGHT: f32 = 0.6;
const RERANK_LEXICAL_WEIGHT: f32 = 0.4;

/// Search output: chunks best-first plus their distinct source paths in
/// first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Retrieved {
    pub chunks: Vec<Chunk>,
    pub sources: Vec<String>,
}

/// Embeds queries and searches an index according to the configured
/// strategy.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    k: usize,
    strategy: RetrievalStrategy,
    rerank: bool,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self {
            embedder,
            k: config.retriever_k,
            strategy: config.strategy,
            rerank: config.hybrid_rerank,
        }
    }

    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
        filter: Option<&MetadataFilter>,
    ) -> RagResult<Retrieved> {
        match self.strategy {
            RetrievalStrategy::Filtered => self.filtered_with_fallback(index, query, filter).await,
            RetrievalStrategy::Hybrid => self.hybrid(index, query).await,
        }
    }

    /// Filtered search with a two-rung ladder: an empty filtered result
    /// retries unfiltered, and a failed filtered attempt does the same.
    async fn filtered_with_fallback(
        &self,
        index: &VectorIndex,
        query: &str,
        filter: Option<&MetadataFilter>,
    ) -> RagResult<Retrieved> {
        match self.search_once(index, query, filter).await {
            Ok(hits) if hits.is_empty() && filter.is_some() => {
                debug!("filtered search matched nothing, retrying unfiltered");
                let hits = self.search_once(index, query, None).await?;
                Ok(collect(hits))
            }
            Ok(hits) => Ok(collect(hits)),
            Err(e) => {
                warn!(error = %e, "filtered search failed, retrying unfiltered");
                let hits = self
                    .search_once(index, query, None)
                    .await
                    .map_err(|e| RagError::Retrieval(format!("unfiltered retry failed: {e}")))?;
                Ok(collect(hits))
            }
        }
    }

    /// Oversampled unfiltered search, optionally reranked by blending
    /// vector similarity with lexical relevance.
    async fn hybrid(&self, index: &VectorIndex, query: &str) -> RagResult<Retrieved> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RagError::Retrieval(format!("query embedding failed: {e}")))?;
        let pool = index.search(&vector, self.k * OVERSAMPLE, None);
        let mut ranked = if self.rerank {
            let query_keywords = extract_keywords(query);
            rerank(pool, query, &query_keywords)
        } else {
            pool
        };
        ranked.truncate(self.k);
        Ok(collect(ranked))
    }

    async fn search_once(
        &self,
        index: &VectorIndex,
        query: &str,
        filter: Option<&MetadataFilter>,
    ) -> RagResult<Vec<(Chunk, f32)>> {
        let vector = self.embedder.embed(query).await?;
        Ok(index.search(&vector, self.k, filter))
    }
}

/// Drops lexically irrelevant candidates and reorders the rest by a
/// similarity/relevance blend.
fn rerank(pool: Vec<(Chunk, f32)>, query: &str, query_keywords: &[String]) -> Vec<(Chunk, f32)> {
    let mut blended: Vec<(Chunk, f32)> = pool
        .into_iter()
        .filter_map(|(chunk, similarity)| {
            let relevance = relevance_score(&chunk.content, query, query_keywords);
            if relevance <= RERANK_RELEVANCE_FLOOR {
                return None;
            }
            let combined =
                similarity * RERANK_VECTOR_WEIGHT + relevance * RERANK_LEXICAL_WEIGHT;
            Some((chunk, combined))
        })
        .collect();
    blended.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    blended
}

fn collect(hits: Vec<(Chunk, f32)>) -> Retrieved {
    let mut seen = FxHashSet::default();
    let mut sources = Vec::new();
    for (chunk, _) in &hits {
        if let Some(source) = chunk.meta_str(meta::SOURCE) {
            if seen.insert(source.to_string()) {
                sources.push(source.to_string());
            }
        }
    }
    Retrieved {
        chunks: hits.into_iter().map(|(chunk, _)| chunk).collect(),
        sources,
    }
}
