//! Snapshot persistence keyed by source content hash.
//!
//! Each build writes one JSON snapshot named `vectorstore_<hash>` under
//! the store directory. A later run with an unchanged source file finds
//! the snapshot by hash and skips embedding entirely.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use super::VectorIndex;
use crate::types::{RagError, RagResult};

#[derive(Serialize, Deserialize)]
struct Snapshot {
    id: String,
    content_hash: String,
    created_at: DateTime<Utc>,
    index: VectorIndex,
}

/// Filesystem home for index snapshots.
#[derive(Clone, Debug)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, content_hash: &str) -> PathBuf {
        self.root.join(format!("vectorstore_{content_hash}"))
    }

    /// Writes the index under its content hash, creating the store
    /// directory if needed.
    pub async fn persist(&self, content_hash: &str, index: &VectorIndex) -> RagResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RagError::Persistence(format!("create {}: {e}", self.root.display())))?;
        let snapshot = Snapshot {
            id: Uuid::new_v4().to_string(),
            content_hash: content_hash.to_string(),
            created_at: Utc::now(),
            index: index.clone(),
        };
        let path = self.snapshot_path(content_hash);
        let payload = serde_json::to_vec(&snapshot)
            .map_err(|e| RagError::Persistence(format!("encode snapshot: {e}")))?;
        fs::write(&path, payload)
            .await
            .map_err(|e| RagError::Persistence(format!("write {}: {e}", path.display())))?;
        info!(path = %path.display(), records = index.len(), "persisted index snapshot");
        Ok(())
    }

    /// Loads the snapshot for this hash. `Ok(None)` means no snapshot
    /// exists yet; corrupt or unreadable snapshots are errors so the
    /// caller can decide to rebuild.
    pub async fn load(&self, content_hash: &str) -> RagResult<Option<VectorIndex>> {
        let path = self.snapshot_path(content_hash);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RagError::Persistence(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            RagError::Persistence(format!("corrupt snapshot {}: {e}", path.display()))
        })?;
        Ok(Some(snapshot.index))
    }
}
