//! Answer generation over retrieved context.
//!
//! The chat model is constrained by a Hebrew system prompt: answer only
//! from the supplied context, never invent entries, and reply as JSON
//! with the answer text and the matching maane codes. Anything the
//! model returns outside that shape is still usable as a plain answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::Chunk;
use crate::providers::ChatProvider;
use crate::types::{RagError, RagResult};

/// Returned verbatim when retrieval produced no context at all.
pub const NO_MATCH_MESSAGE: &str = "לא מצאתי מענים מתאימים לשאלתך. אנא דייק את החיפוש.";

/// Returned when the chat provider fails.
pub const GENERATION_APOLOGY: &str = "מצטער, אירעה שגיאה ביצירת התשובה. אנא נסה שוב.";

/// The JSON shape the model is instructed to produce.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    /// Comma-separated maane codes cited by the answer.
    #[serde(default)]
    pub maanim: String,
}

/// Parses a model reply, falling back to the raw text as the answer
/// when it is not the requested JSON shape.
pub fn parse_reply(raw: &str) -> GeneratedAnswer {
    let trimmed = raw.trim();
    match serde_json::from_str::<GeneratedAnswer>(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => GeneratedAnswer {
            answer: trimmed.to_string(),
            maanim: String::new(),
        },
    }
}

fn build_system_prompt(context: &str, user_budgets: &[String]) -> String {
    let budgets = if user_budgets.is_empty() {
        "לא צוינו תקציבים".to_string()
    } else {
        user_budgets.join("\n")
    };
    format!(
        "אתה עוזר חיפוש למאגר מענים חינוכיים. פעל לפי הכללים הבאים:\n\
         1. ענה בעברית בלבד.\n\
         2. הסתמך אך ורק על ההקשר שסופק. אל תשתמש בידע חיצוני.\n\
         3. לעולם אל תמציא מענים או תקציבים שאינם מופיעים בהקשר.\n\
         4. אל תמליץ על מענה אחד על פני מענה אחר.\n\
         5. די בתקציב משותף אחד בין תקציבי המשתמש לתקציבי המענה כדי שהמענה ייחשב מתאים.\n\
         6. אם רוב המענים בהקשר מתאימים לשאלה, ציין זאת בתשובה.\n\
         7. הצג לכל היותר חמישה מענים.\n\
         8. אם אף מענה אינו מתאים, השב בדיוק: \"{NO_MATCH_MESSAGE}\"\n\
         9. אם נמצאו מענים מתאימים, פתח בנוסח: \"מצאתי מענים מתאימים לשאלתך: [שמות המענים]\". מותר לגוון מעט את הניסוח.\n\
         10. החזר JSON בלבד, במבנה: {{\"answer\": \"...\", \"maanim\": \"קודי המענה מופרדים בפסיקים\"}}\n\
         \n\
         הקשר:\n{context}\n\
         \n\
         התקציבים של המשתמש:\n{budgets}"
    )
}

/// Turns retrieved chunks and a question into a final answer.
pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }

    /// Infallible entry point. Empty context short-circuits to the
    /// no-match message without calling the model; a provider failure
    /// degrades to the apology text.
    pub async fn generate(
        &self,
        question: &str,
        context_chunks: &[Chunk],
        user_budgets: &[String],
    ) -> GeneratedAnswer {
        if context_chunks.is_empty() {
            debug!("no context retrieved, returning the no-match answer");
            return GeneratedAnswer {
                answer: NO_MATCH_MESSAGE.to_string(),
                maanim: String::new(),
            };
        }
        match self.try_generate(question, context_chunks, user_budgets).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "generation failed, answering with the apology");
                GeneratedAnswer {
                    answer: GENERATION_APOLOGY.to_string(),
                    maanim: String::new(),
                }
            }
        }
    }

    pub async fn try_generate(
        &self,
        question: &str,
        context_chunks: &[Chunk],
        user_budgets: &[String],
    ) -> RagResult<GeneratedAnswer> {
        let context = context_chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let system_prompt = build_system_prompt(&context, user_budgets);
        let reply = self
            .chat
            .complete(&system_prompt, question)
            .await
            .map_err(|e| RagError::Generation(e.to_string()))?;
        Ok(parse_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::providers::MockChatProvider;

    fn chunks() -> Vec<Chunk> {
        vec![
            Document::new("מענה רובוטיקה\nM-001\n11 סל תשתיות בית ספריות"),
            Document::new("מענה הדרכה\nM-002\n12 סל מנהיגות חינוכית"),
        ]
    }

    #[test]
    fn json_reply_is_parsed() {
        let parsed = parse_reply(
            r#" {"answer": "מצאתי מענים מתאימים לשאלתך: מענה רובוטיקה", "maanim": "M-001"} "#,
        );
        assert_eq!(parsed.maanim, "M-001");
        assert!(parsed.answer.starts_with("מצאתי מענים"));
    }

    #[test]
    fn missing_maanim_field_defaults_to_empty() {
        let parsed = parse_reply(r#"{"answer": "תשובה"}"#);
        assert_eq!(parsed.answer, "תשובה");
        assert_eq!(parsed.maanim, "");
    }

    #[test]
    fn plain_text_reply_becomes_the_answer() {
        let parsed = parse_reply("  תשובה חופשית ללא מבנה  ");
        assert_eq!(parsed.answer, "תשובה חופשית ללא מבנה");
        assert_eq!(parsed.maanim, "");
    }

    #[tokio::test]
    async fn empty_context_short_circuits_without_a_model_call() {
        let chat = Arc::new(MockChatProvider::with_replies(vec!["ignored".into()]));
        let generator = AnswerGenerator::new(chat.clone());

        let answer = generator.generate("שאלה", &[], &[]).await;
        assert_eq!(answer.answer, NO_MATCH_MESSAGE);
        assert_eq!(answer.maanim, "");
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_the_apology() {
        let chat = Arc::new(MockChatProvider::failing());
        let generator = AnswerGenerator::new(chat.clone());

        let answer = generator.generate("שאלה", &chunks(), &[]).await;
        assert_eq!(answer.answer, GENERATION_APOLOGY);
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_context_rules_and_budgets() {
        let chat = Arc::new(MockChatProvider::with_replies(vec![
            r#"{"answer": "מצאתי", "maanim": "M-001, M-002"}"#.to_string(),
        ]));
        let generator = AnswerGenerator::new(chat.clone());
        let budgets = vec!["סל תשתיות בית ספריות".to_string()];

        let answer = generator.generate("איזה מענה רובוטיקה?", &chunks(), &budgets).await;
        assert_eq!(answer.maanim, "M-001, M-002");

        let prompt = chat.last_system_prompt().unwrap();
        assert!(prompt.contains("מענה רובוטיקה\nM-001"));
        assert!(prompt.contains("מענה הדרכה\nM-002"));
        assert!(prompt.contains(NO_MATCH_MESSAGE));
        assert!(prompt.contains("התקציבים של המשתמש:\nסל תשתיות בית ספריות"));
        assert!(prompt.contains(r#"{"answer": "...", "maanim":"#));
    }

    #[tokio::test]
    async fn missing_budgets_are_spelled_out() {
        let chat = Arc::new(MockChatProvider::with_replies(vec!["{}".to_string()]));
        let generator = AnswerGenerator::new(chat.clone());

        let _ = generator.generate("שאלה", &chunks(), &[]).await;
        let prompt = chat.last_system_prompt().unwrap();
        assert!(prompt.contains("לא צוינו תקציבים"));
    }

    #[tokio::test]
    async fn try_generate_maps_provider_errors() {
        let chat = Arc::new(MockChatProvider::failing());
        let generator = AnswerGenerator::new(chat);

        let err = generator
            .try_generate("שאלה", &chunks(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }
}
