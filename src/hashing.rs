use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::error::SyncError;

/// Lowercase hex SHA-256 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Reads the whole file at `path` and returns its [`content_hash`].
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let content = fs::read(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to read local file for hashing");
        SyncError::filesystem(path, e)
    })?;
    let hash = content_hash(&content);
    debug!(path = %path.display(), %hash, "Hashed local file");
    Ok(hash)
}
