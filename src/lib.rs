//! ```text
//! Source file ──► ingestion::hashing ──► content hash (cache key)
//!             └─► ingestion::loader ──► Documents ──► ingestion::chunker ──► Chunks
//!
//! Chunks ──► providers::EmbeddingProvider ──► store::VectorIndex
//!                                                 │
//!                                                 └─► store::IndexStore (vectorstore_<hash>)
//!
//! manager::IndexManager ──► ActiveIndex (reuse / load / build)
//!
//! Question ──► pipeline::QueryStage ──► retrieval::Retriever ──► generator::AnswerGenerator
//!                                                                      │
//!                                                                      └─► PipelineReply
//! ```
//!
pub mod config;
pub mod document;
pub mod generator;
pub mod ingestion;
pub mod manager;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod store;
pub mod telemetry;
pub mod types;

pub use config::{ChunkingProfile, RagConfig, RetrievalStrategy};
pub use document::{Chunk, Document, Population};
pub use generator::{AnswerGenerator, GENERATION_APOLOGY, GeneratedAnswer, NO_MATCH_MESSAGE};
pub use manager::{ActiveIndex, IndexManager, InitOutcome};
pub use pipeline::{Pipeline, PipelineReply, PipelineState};
pub use providers::{
    ChatProvider, EmbeddingProvider, MockChatProvider, MockEmbeddingProvider, OpenAiChatProvider,
    OpenAiEmbeddingProvider,
};
pub use retrieval::{Retrieved, Retriever};
pub use store::{IndexStore, MetadataFilter, VectorIndex, VectorRecord};
pub use types::{RagError, RagResult};
