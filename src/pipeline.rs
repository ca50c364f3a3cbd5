//! The query pipeline: rewrite, retrieve, generate.
//!
//! Each stage takes the state and returns it transformed. Retrieval and
//! generation failures degrade inside their stages, so `run` always
//! produces a reply the caller can show to the user.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::document::{Population, meta};
use crate::generator::{AnswerGenerator, GeneratedAnswer};
use crate::providers::{ChatProvider, EmbeddingProvider};
use crate::retrieval::{Retrieved, Retriever};
use crate::store::{MetadataFilter, VectorIndex};

/// State threaded through the pipeline stages.
pub struct PipelineState {
    pub question: String,
    pub search_query: String,
    pub index: Arc<VectorIndex>,
    pub retrieved: Retrieved,
    pub answer: Option<GeneratedAnswer>,
    pub user_budgets: Vec<String>,
}

impl PipelineState {
    pub fn new(
        index: Arc<VectorIndex>,
        question: impl Into<String>,
        user_budgets: Vec<String>,
    ) -> Self {
        let question = question.into();
        Self {
            search_query: question.clone(),
            question,
            index,
            retrieved: Retrieved::default(),
            answer: None,
            user_budgets,
        }
    }

    fn into_reply(self) -> PipelineReply {
        let answer = self.answer.unwrap_or_default();
        let cited_codes = answer
            .maanim
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();
        PipelineReply {
            answer: answer.answer,
            cited_codes,
            sources: self.retrieved.sources,
        }
    }
}

/// What the caller gets back: the answer text, the maane codes it
/// cites, and the distinct sources the context came from.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineReply {
    pub answer: String,
    pub cited_codes: Vec<String>,
    pub sources: Vec<String>,
}

/// First pipeline stage: shapes the search query.
#[async_trait]
pub trait QueryStage: Send + Sync {
    async fn process(&self, state: PipelineState) -> PipelineState;
}

/// Searches with the user's question as-is.
pub struct IdentityQuery;

#[async_trait]
impl QueryStage for IdentityQuery {
    async fn process(&self, state: PipelineState) -> PipelineState {
        state
    }
}

/// Asks the chat model to rewrite the question into a focused search
/// query. Any failure keeps the original question.
pub struct LlmQueryRewrite {
    chat: Arc<dyn ChatProvider>,
}

impl LlmQueryRewrite {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl QueryStage for LlmQueryRewrite {
    async fn process(&self, mut state: PipelineState) -> PipelineState {
        let budgets = if state.user_budgets.is_empty() {
            "לא צוינו תקציבים".to_string()
        } else {
            state.user_budgets.join("\n")
        };
        let instruction = format!(
            "נסח מחדש את שאלת המשתמש לשאילתת חיפוש סמנטי ממוקדת במאגר מענים. \
             השתמש בשאלה ובתקציבים של המשתמש. \
             החזר את טקסט השאילתה בלבד, ללא הסברים.\n\
             \n\
             התקציבים של המשתמש:\n{budgets}"
        );
        match self.chat.complete(&instruction, &state.question).await {
            Ok(reply) => {
                let rewritten = reply.trim();
                if rewritten.is_empty() {
                    debug!("query rewrite returned nothing, keeping the question");
                } else {
                    debug!(query = %rewritten, "rewrote the search query");
                    state.search_query = rewritten.to_string();
                }
            }
            Err(e) => {
                warn!(error = %e, "query rewrite failed, keeping the question");
            }
        }
        state
    }
}

/// End-to-end question answering over a built index.
pub struct Pipeline {
    query_stage: Arc<dyn QueryStage>,
    retriever: Retriever,
    generator: AnswerGenerator,
    filter: Option<MetadataFilter>,
}

impl Pipeline {
    /// Wires the stages from configuration. The default metadata filter
    /// targets institution-level entries; `with_filter` overrides it.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        let query_stage: Arc<dyn QueryStage> = if config.query_rewrite {
            Arc::new(LlmQueryRewrite::new(chat.clone()))
        } else {
            Arc::new(IdentityQuery)
        };
        Self {
            query_stage,
            retriever: Retriever::new(embedder, config),
            generator: AnswerGenerator::new(chat),
            filter: Some(MetadataFilter::field(
                meta::POPULATION,
                Population::Institution.as_str(),
            )),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<MetadataFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub async fn run(
        &self,
        index: Arc<VectorIndex>,
        question: impl Into<String>,
        user_budgets: Vec<String>,
    ) -> PipelineReply {
        let state = PipelineState::new(index, question, user_budgets);
        let state = self.query_stage.process(state).await;
        let state = self.retrieve_stage(state).await;
        let state = self.generate_stage(state).await;
        state.into_reply()
    }

    async fn retrieve_stage(&self, mut state: PipelineState) -> PipelineState {
        match self
            .retriever
            .retrieve(&state.index, &state.search_query, self.filter.as_ref())
            .await
        {
            Ok(retrieved) => state.retrieved = retrieved,
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing with empty context");
            }
        }
        state
    }

    /// Generation answers the user's question, not the rewritten search
    /// query.
    async fn generate_stage(&self, mut state: PipelineState) -> PipelineState {
        let answer = self
            .generator
            .generate(&state.question, &state.retrieved.chunks, &state.user_budgets)
            .await;
        state.answer = Some(answer);
        state
    }
}
