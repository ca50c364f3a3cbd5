//! Index lifecycle: hash the source, reuse or load a snapshot, rebuild
//! only when the content actually changed.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::{PopulationClassifier, positional_population};
use crate::ingestion::{TextChunker, hash_file, load_documents};
use crate::providers::EmbeddingProvider;
use crate::store::{IndexStore, VectorIndex};
use crate::types::{RagError, RagResult};

/// The currently served index together with the content hash it was
/// built from.
#[derive(Clone, Debug)]
pub struct ActiveIndex {
    pub content_hash: String,
    pub index: Arc<VectorIndex>,
}

/// How `initialize` satisfied the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// The in-memory index already matches the source file.
    Reused,
    /// A snapshot for this content hash was loaded from disk.
    Loaded,
    /// The index was freshly embedded and persisted.
    Built,
}

/// Owns the active index and decides when to rebuild it.
pub struct IndexManager {
    store: IndexStore,
    chunker: TextChunker,
    classifier: PopulationClassifier,
    active: RwLock<Option<ActiveIndex>>,
}

impl IndexManager {
    pub fn new(config: &RagConfig) -> Self {
        Self {
            store: IndexStore::new(&config.store_dir),
            chunker: TextChunker::new(config.chunking),
            classifier: positional_population,
            active: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: PopulationClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The index served right now, if any.
    pub fn active(&self) -> Option<ActiveIndex> {
        self.active.read().clone()
    }

    /// Makes an index for `source_path` available, cheapest rung first:
    /// reuse the in-memory one, load a snapshot by content hash, or
    /// rebuild from scratch. A hashing failure disables caching for
    /// this call but never blocks the rebuild.
    pub async fn initialize(
        &self,
        source_path: impl AsRef<Path>,
        embedder: &dyn EmbeddingProvider,
    ) -> RagResult<InitOutcome> {
        let path = source_path.as_ref();
        let content_hash = match hash_file(path).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "hashing failed, rebuilding without cache");
                String::new()
            }
        };

        if !content_hash.is_empty() {
            {
                let guard = self.active.read();
                if let Some(active) = guard.as_ref() {
                    if active.content_hash == content_hash {
                        info!("source unchanged, reusing the active index");
                        return Ok(InitOutcome::Reused);
                    }
                }
            }
            match self.store.load(&content_hash).await {
                Ok(Some(index)) => {
                    info!(records = index.len(), "loaded index snapshot");
                    self.swap(content_hash, index);
                    return Ok(InitOutcome::Loaded);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "snapshot unreadable, rebuilding");
                }
            }
        }

        let documents = load_documents(path, self.classifier).await;
        if documents.is_empty() {
            return Err(RagError::Input(format!(
                "no usable documents in {}",
                path.display()
            )));
        }
        let chunks = self.chunker.split_documents(&documents);
        let index = VectorIndex::build(chunks, embedder).await?;

        if content_hash.is_empty() {
            warn!("no content hash, skipping snapshot persistence");
        } else if let Err(e) = self.store.persist(&content_hash, &index).await {
            warn!(error = %e, "snapshot persist failed, continuing in memory");
        }
        info!(
            documents = documents.len(),
            records = index.len(),
            "built index"
        );
        self.swap(content_hash, index);
        Ok(InitOutcome::Built)
    }

    fn swap(&self, content_hash: String, index: VectorIndex) {
        *self.active.write() = Some(ActiveIndex {
            content_hash,
            index: Arc::new(index),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::providers::MockEmbeddingProvider;

    fn test_config(store_dir: &Path) -> RagConfig {
        RagConfig {
            store_dir: store_dir.to_path_buf(),
            ..RagConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_source_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = IndexManager::new(&test_config(dir.path()));
        let embedder = MockEmbeddingProvider::new();

        let err = manager
            .initialize(dir.path().join("missing.json"), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Input(_)));
        assert!(manager.active().is_none());
    }

    #[tokio::test]
    async fn text_source_builds_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&source).unwrap();
        writeln!(file, "מענה רובוטיקה לבתי ספר").unwrap();

        let manager = IndexManager::new(&test_config(dir.path()));
        let embedder = MockEmbeddingProvider::new();

        let outcome = manager.initialize(&source, &embedder).await.unwrap();
        assert_eq!(outcome, InitOutcome::Built);

        let active = manager.active().unwrap();
        assert!(!active.index.is_empty());
        assert_eq!(active.content_hash.len(), 64);
    }

    #[tokio::test]
    async fn unchanged_source_is_reused_without_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "מענה הדרכה למורים").unwrap();

        let manager = IndexManager::new(&test_config(dir.path()));
        let embedder = MockEmbeddingProvider::new();

        assert_eq!(
            manager.initialize(&source, &embedder).await.unwrap(),
            InitOutcome::Built
        );
        let after_build = embedder.calls();

        assert_eq!(
            manager.initialize(&source, &embedder).await.unwrap(),
            InitOutcome::Reused
        );
        assert_eq!(embedder.calls(), after_build);
    }

    #[tokio::test]
    async fn fresh_manager_loads_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "מענה הדרכה למורים").unwrap();
        let config = test_config(dir.path());

        let first = IndexManager::new(&config);
        let embedder = MockEmbeddingProvider::new();
        first.initialize(&source, &embedder).await.unwrap();
        let after_build = embedder.calls();

        let second = IndexManager::new(&config);
        assert_eq!(
            second.initialize(&source, &embedder).await.unwrap(),
            InitOutcome::Loaded
        );
        assert_eq!(embedder.calls(), after_build);
    }

    #[tokio::test]
    async fn changed_source_triggers_a_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "גרסה ראשונה").unwrap();

        let manager = IndexManager::new(&test_config(dir.path()));
        let embedder = MockEmbeddingProvider::new();
        manager.initialize(&source, &embedder).await.unwrap();
        let first_hash = manager.active().unwrap().content_hash;

        std::fs::write(&source, "גרסה שנייה, שונה לגמרי").unwrap();
        assert_eq!(
            manager.initialize(&source, &embedder).await.unwrap(),
            InitOutcome::Built
        );
        assert_ne!(manager.active().unwrap().content_hash, first_hash);
    }
}
