//! File storage behind the evidence module.
//!
//! Evidence bytes live behind the `FileStorage` trait so the domain never
//! touches paths directly. The shipped implementation writes under a local
//! root directory; a remote-backed implementation would plug in at the same
//! seam.

use crate::domain::errors::DomainError;
use crate::domain::types::StorageKind;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Storage seam for evidence file bytes, keyed by opaque storage keys.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persists the bytes under the key, overwriting any previous content.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Reads the bytes stored under the key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, DomainError>;

    /// Removes the bytes stored under the key. Missing keys are an error so
    /// callers can decide whether absence is tolerable.
    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// The storage mode this backend serves.
    fn kind(&self) -> StorageKind;
}

/// Local filesystem storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolves a storage key to a path under the root. Keys are flattened
    /// so they cannot escape the root directory.
    fn resolve(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(safe)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DomainError::Storage {
                message: format!("creating storage root: {}", e),
            })?;
        let path = self.resolve(key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::Storage {
                message: format!("writing {}: {}", path.display(), e),
            })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.resolve(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DomainError::FileMissing {
                key: key.to_string(),
            }),
            Err(e) => Err(DomainError::Storage {
                message: format!("reading {}: {}", path.display(), e),
            }),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let path = self.resolve(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DomainError::FileMissing {
                key: key.to_string(),
            }),
            Err(e) => Err(DomainError::Storage {
                message: format!("removing {}: {}", path.display(), e),
            }),
        }
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }
}

#[cfg(test)]
#[path = "tests/storage_tests.rs"]
mod tests;
