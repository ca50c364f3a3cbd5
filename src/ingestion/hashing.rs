//! Content fingerprinting for source data files.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::types::RagError;

const BLOCK_SIZE: usize = 8192;

/// Hex SHA-256 digest of the file's bytes, read block-wise.
///
/// The digest is a cache key for change detection, not a security
/// boundary. An unreadable file surfaces as an error; the caller decides
/// whether that means "rebuild without a cache" or "fail the request".
pub async fn hash_file(path: impl AsRef<Path>) -> Result<String, RagError> {
    let mut file = File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of an in-memory byte slice; agrees with [`hash_file`] over the
/// same bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
