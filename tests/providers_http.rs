//! Wire-level provider tests against a local mock server.

use httpmock::prelude::*;
use serde_json::json;

use maane_rag::providers::{OpenAiChatProvider, OpenAiEmbeddingProvider};
use maane_rag::{ChatProvider, EmbeddingProvider, RagError};

#[tokio::test]
async fn embeddings_request_carries_model_inputs_and_auth() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "text-embedding-3-small",
                    "input": ["אלף", "בית"],
                }));
            then.status(200).json_body(json!({
                "data": [
                    {"embedding": [0.25, 0.5]},
                    {"embedding": [0.75, 1.0]},
                ],
            }));
        })
        .await;

    let provider = OpenAiEmbeddingProvider::new(
        &server.url("/v1"),
        "text-embedding-3-small",
        Some("sk-test".to_string()),
    )
    .unwrap();

    let vectors = provider
        .embed_batch(&["אלף".to_string(), "בית".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![0.25, 0.5], vec![0.75, 1.0]]);
}

#[tokio::test]
async fn trailing_slash_base_urls_resolve_to_the_same_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200)
                .json_body(json!({"data": [{"embedding": [1.0]}]}));
        })
        .await;

    let provider =
        OpenAiEmbeddingProvider::new(&server.url("/v1/"), "text-embedding-3-small", None).unwrap();
    let vector = provider.embed("שאלה").await.unwrap();

    mock.assert_async().await;
    assert_eq!(vector, vec![1.0]);
}

#[tokio::test]
async fn embedding_server_errors_surface_as_provider_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(500);
        })
        .await;

    let provider =
        OpenAiEmbeddingProvider::new(&server.url("/v1"), "text-embedding-3-small", None).unwrap();
    let err = provider.embed("שאלה").await.unwrap_err();

    assert!(matches!(
        err,
        RagError::Provider {
            provider: "embeddings",
            ..
        }
    ));
}

#[tokio::test]
async fn short_embedding_responses_are_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200)
                .json_body(json!({"data": [{"embedding": [1.0]}]}));
        })
        .await;

    let provider =
        OpenAiEmbeddingProvider::new(&server.url("/v1"), "text-embedding-3-small", None).unwrap();
    let err = provider
        .embed_batch(&["אלף".to_string(), "בית".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Provider { .. }));
}

#[tokio::test]
async fn chat_request_pins_temperature_and_returns_the_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-4o-mini",
                    "temperature": 0,
                    "messages": [
                        {"role": "system", "content": "כללי המערכת"},
                        {"role": "user", "content": "איזה מענה רובוטיקה?"},
                    ],
                }));
            then.status(200).json_body(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "מצאתי מענים"}},
                ],
            }));
        })
        .await;

    let provider = OpenAiChatProvider::new(
        &server.url("/v1"),
        "gpt-4o-mini",
        Some("sk-test".to_string()),
    )
    .unwrap();

    let reply = provider
        .complete("כללי המערכת", "איזה מענה רובוטיקה?")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply, "מצאתי מענים");
}

#[tokio::test]
async fn chat_without_choices_is_a_provider_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let provider = OpenAiChatProvider::new(&server.url("/v1"), "gpt-4o-mini", None).unwrap();
    let err = provider.complete("s", "u").await.unwrap_err();

    assert!(matches!(
        err,
        RagError::Provider {
            provider: "chat",
            ..
        }
    ));
}

#[tokio::test]
async fn malformed_chat_payloads_are_provider_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body("not json at all");
        })
        .await;

    let provider = OpenAiChatProvider::new(&server.url("/v1"), "gpt-4o-mini", None).unwrap();
    let err = provider.complete("s", "u").await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("malformed response"), "got: {message}");
}
