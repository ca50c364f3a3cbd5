//! Deterministic in-process collaborators for tests and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ChatProvider, EmbeddingProvider};
use crate::types::RagError;

/// Hash-derived embeddings: stable per input text, unit length, no
/// network. Counts calls so tests can prove an index was not re-embedded.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::with_dimensions(8)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(hash_to_vec(text, self.dimensions))
    }
}

/// Folds a seed hash of the text into a normalized pseudo-random vector.
fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    let mut vector: Vec<f32> = (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect();
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Canned chat replies cycling through a script; captures the last
/// system prompt so tests can assert what the model was given.
pub struct MockChatProvider {
    replies: Vec<String>,
    calls: AtomicUsize,
    fail: bool,
    last_system_prompt: Mutex<Option<String>>,
}

impl MockChatProvider {
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
            fail: false,
            last_system_prompt: Mutex::new(None),
        }
    }

    /// Every call errors; exercises the apology path.
    pub fn failing() -> Self {
        Self {
            replies: Vec::new(),
            calls: AtomicUsize::new(0),
            fail: true,
            last_system_prompt: Mutex::new(None),
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The system prompt of the most recent completion, if any.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.last_system_prompt.lock().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        _user_message: &str,
    ) -> Result<String, RagError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system_prompt.lock() = Some(system_prompt.to_string());
        if self.fail {
            return Err(RagError::Provider {
                provider: "chat",
                message: "scripted failure".to_string(),
            });
        }
        if self.replies.is_empty() {
            return Ok(String::new());
        }
        Ok(self.replies[index % self.replies.len()].clone())
    }
}
