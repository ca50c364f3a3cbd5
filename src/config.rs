//! Environment-resolved runtime configuration.
//!
//! Every knob has a code default so the pipeline runs without any
//! environment at all; `.env` files are honored through `dotenvy`.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Smallest and largest top-k the retriever accepts.
const K_RANGE: (usize, usize) = (3, 6);

/// Which retrieval strategy serves queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Metadata-filtered search with an unfiltered fallback.
    #[default]
    Filtered,
    /// Keyword-aware search over an oversampled candidate pool.
    Hybrid,
}

impl RetrievalStrategy {
    /// Parses the `MAANE_STRATEGY` value; unknown values fall back to
    /// the filtered strategy.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hybrid" => RetrievalStrategy::Hybrid,
            _ => RetrievalStrategy::Filtered,
        }
    }
}

/// Window size and overlap handed to the chunker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingProfile {
    pub max_chunk_size: usize,
    pub overlap: usize,
}

impl ChunkingProfile {
    /// Short structured records: effectively "do not split".
    pub const RECORDS: Self = Self {
        max_chunk_size: 100_000,
        overlap: 0,
    };

    /// Long free text.
    pub const FREE_TEXT: Self = Self {
        max_chunk_size: 1_000,
        overlap: 200,
    };

    /// Parses the `MAANE_CHUNK_PRESET` value; unknown values fall back
    /// to the records profile.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Self::FREE_TEXT,
            _ => Self::RECORDS,
        }
    }
}

impl Default for ChunkingProfile {
    fn default() -> Self {
        Self::RECORDS
    }
}

/// Runtime configuration for providers, the snapshot store, and the
/// retrieval pipeline.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub embed_base_url: String,
    pub embed_model: String,
    pub chat_base_url: String,
    pub chat_model: String,
    pub api_key: Option<String>,
    pub store_dir: PathBuf,
    pub retriever_k: usize,
    pub strategy: RetrievalStrategy,
    pub hybrid_rerank: bool,
    pub query_rewrite: bool,
    pub chunking: ChunkingProfile,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embed_base_url: "https://api.openai.com/v1".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            chat_base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key: None,
            store_dir: PathBuf::from("vectorDB"),
            retriever_k: 6,
            strategy: RetrievalStrategy::default(),
            hybrid_rerank: false,
            query_rewrite: false,
            chunking: ChunkingProfile::default(),
        }
    }
}

impl RagConfig {
    /// Resolves the configuration from the environment, falling back to
    /// the defaults above for anything unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            embed_base_url: env_or("MAANE_EMBED_BASE_URL", &defaults.embed_base_url),
            embed_model: env_or("MAANE_EMBED_MODEL", &defaults.embed_model),
            chat_base_url: env_or("MAANE_CHAT_BASE_URL", &defaults.chat_base_url),
            chat_model: env_or("MAANE_CHAT_MODEL", &defaults.chat_model),
            api_key: env::var("MAANE_API_KEY").ok().filter(|key| !key.is_empty()),
            store_dir: PathBuf::from(env_or(
                "MAANE_STORE_DIR",
                &defaults.store_dir.to_string_lossy(),
            )),
            retriever_k: resolve_k(defaults.retriever_k),
            strategy: env::var("MAANE_STRATEGY")
                .map(|raw| RetrievalStrategy::parse(&raw))
                .unwrap_or(defaults.strategy),
            hybrid_rerank: env_flag("MAANE_HYBRID_RERANK"),
            query_rewrite: env_flag("MAANE_QUERY_REWRITE"),
            chunking: env::var("MAANE_CHUNK_PRESET")
                .map(|raw| ChunkingProfile::parse(&raw))
                .unwrap_or(defaults.chunking),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_k(default: usize) -> usize {
    let Ok(raw) = env::var("MAANE_RETRIEVER_K") else {
        return default;
    };
    let Ok(parsed) = raw.parse::<usize>() else {
        warn!(raw = %raw, "unparseable MAANE_RETRIEVER_K, using default");
        return default;
    };
    let clamped = parsed.clamp(K_RANGE.0, K_RANGE.1);
    if clamped != parsed {
        warn!(parsed, clamped, "MAANE_RETRIEVER_K outside 3-6, clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_without_environment() {
        let config = RagConfig::default();
        assert_eq!(config.retriever_k, 6);
        assert_eq!(config.strategy, RetrievalStrategy::Filtered);
        assert!(!config.hybrid_rerank);
        assert!(!config.query_rewrite);
        assert_eq!(config.chunking, ChunkingProfile::RECORDS);
        assert_eq!(config.store_dir, PathBuf::from("vectorDB"));
    }

    #[test]
    fn strategy_parsing_is_case_insensitive() {
        assert_eq!(RetrievalStrategy::parse("HYBRID"), RetrievalStrategy::Hybrid);
        assert_eq!(RetrievalStrategy::parse("hybrid "), RetrievalStrategy::Hybrid);
        assert_eq!(RetrievalStrategy::parse("filtered"), RetrievalStrategy::Filtered);
        assert_eq!(RetrievalStrategy::parse("nonsense"), RetrievalStrategy::Filtered);
    }

    #[test]
    fn chunk_presets_match_the_two_ingestion_profiles() {
        assert_eq!(ChunkingProfile::RECORDS.max_chunk_size, 100_000);
        assert_eq!(ChunkingProfile::RECORDS.overlap, 0);
        assert_eq!(ChunkingProfile::FREE_TEXT.max_chunk_size, 1_000);
        assert_eq!(ChunkingProfile::FREE_TEXT.overlap, 200);
        assert_eq!(ChunkingProfile::parse("text"), ChunkingProfile::FREE_TEXT);
        assert_eq!(ChunkingProfile::parse("records"), ChunkingProfile::RECORDS);
    }
}
