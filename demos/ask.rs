//! Ask a question against a maane catalog from the command line.
//!
//! ```bash
//! MAANE_SOURCE_FILE=data/maanim.json \
//! MAANE_EMBED_BASE_URL=http://localhost:11434/v1 \
//! MAANE_CHAT_BASE_URL=http://localhost:11434/v1 \
//! cargo run --example ask -- "איזה מענה רובוטיקה קיים לבית ספר?"
//! ```

use std::env;
use std::sync::Arc;

use maane_rag::providers::{OpenAiChatProvider, OpenAiEmbeddingProvider};
use maane_rag::telemetry::init_tracing;
use maane_rag::{IndexManager, Pipeline, RagConfig, RagError};

#[tokio::main]
async fn main() -> Result<(), RagError> {
    init_tracing();

    let config = RagConfig::from_env();
    let source = env::var("MAANE_SOURCE_FILE").unwrap_or_else(|_| "data/maanim.json".to_string());

    let question: String = env::args().skip(1).collect::<Vec<_>>().join(" ");
    let question = if question.trim().is_empty() {
        "איזה מענה קשור לרובוטיקה?".to_string()
    } else {
        question
    };

    let budgets: Vec<String> = env::var("MAANE_USER_BUDGETS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|_| {
            vec![
                "סל תשתיות בית ספריות".to_string(),
                "סל מנהיגות חינוכית".to_string(),
            ]
        });

    let embedder = Arc::new(OpenAiEmbeddingProvider::new(
        &config.embed_base_url,
        &config.embed_model,
        config.api_key.clone(),
    )?);
    let chat = Arc::new(OpenAiChatProvider::new(
        &config.chat_base_url,
        &config.chat_model,
        config.api_key.clone(),
    )?);

    let manager = IndexManager::new(&config);
    let outcome = manager.initialize(&source, embedder.as_ref()).await?;
    let Some(active) = manager.active() else {
        return Err(RagError::Input("no active index after initialize".to_string()));
    };

    println!("→ Index ready ({outcome:?}, {} records)", active.index.len());
    println!("→ Asking: {question}");

    let pipeline = Pipeline::new(&config, embedder, chat);
    let reply = pipeline.run(active.index.clone(), question, budgets).await;

    println!("\n✅ Answer");
    println!("{}", reply.answer);
    if !reply.cited_codes.is_empty() {
        println!("\n  maane codes : {}", reply.cited_codes.join(", "));
    }
    if !reply.sources.is_empty() {
        println!("  sources     : {}", reply.sources.join(", "));
    }
    Ok(())
}
