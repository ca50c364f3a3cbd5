//! OpenAI-compatible HTTP collaborators.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{ChatProvider, EmbeddingProvider};
use crate::types::RagError;

const EMBED_PROVIDER: &str = "embeddings";
const CHAT_PROVIDER: &str = "chat";

fn endpoint_url(provider: &'static str, base_url: &str, path: &str) -> Result<Url, RagError> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|err| RagError::Provider {
        provider,
        message: format!("invalid endpoint {raw}: {err}"),
    })
}

/// Embeddings over an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbeddingProvider {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, RagError> {
        Ok(Self {
            client: Client::new(),
            endpoint: endpoint_url(EMBED_PROVIDER, base_url, "embeddings")?,
            model: model.into(),
            api_key,
        })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&json!({
            "model": self.model,
            "input": inputs,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| RagError::Provider {
                provider: EMBED_PROVIDER,
                message: err.to_string(),
            })?;
        let payload: EmbeddingResponse =
            response.json().await.map_err(|err| RagError::Provider {
                provider: EMBED_PROVIDER,
                message: format!("malformed response: {err}"),
            })?;
        if payload.data.len() != inputs.len() {
            return Err(RagError::Provider {
                provider: EMBED_PROVIDER,
                message: format!(
                    "expected {} embeddings, got {}",
                    inputs.len(),
                    payload.data.len()
                ),
            });
        }
        Ok(payload.data.into_iter().map(|datum| datum.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let input = [text.to_string()];
        let mut vectors = self.request(&input).await?;
        vectors.pop().ok_or_else(|| RagError::Provider {
            provider: EMBED_PROVIDER,
            message: "empty embedding response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Chat completions over an OpenAI-compatible `/chat/completions`
/// endpoint, pinned to temperature zero.
pub struct OpenAiChatProvider {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChatProvider {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, RagError> {
        Ok(Self {
            client: Client::new(),
            endpoint: endpoint_url(CHAT_PROVIDER, base_url, "chat/completions")?,
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, RagError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message},
            ],
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| RagError::Provider {
                provider: CHAT_PROVIDER,
                message: err.to_string(),
            })?;
        let payload: ChatResponse = response.json().await.map_err(|err| RagError::Provider {
            provider: CHAT_PROVIDER,
            message: format!("malformed response: {err}"),
        })?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Provider {
                provider: CHAT_PROVIDER,
                message: "no choices in chat response".to_string(),
            })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}
