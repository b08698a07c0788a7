//! Primary object storage behind the [`ObjectStore`] trait.
//!
//! The filesystem implementation mirrors how a managed bucket behaves:
//! `put` returns a fetchable public address, `delete` removes the object,
//! and every path is validated against traversal before it touches disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ObjectStoreError;

/// Durable binary-asset storage; canonical location for uploaded media
/// when reachable.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `path`, returning a retrievable address.
    async fn put(&self, path: &str, data: &[u8]) -> Result<String, ObjectStoreError>;

    /// Fetch the object stored under `path`.
    async fn get(&self, path: &str) -> Result<Bytes, ObjectStoreError>;

    /// Remove the object stored under `path`.
    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError>;
}

/// Verify that a relative object path cannot escape the base directory.
fn safe_relative(path: &str) -> Result<PathBuf, ObjectStoreError> {
    if path.is_empty() || path.contains('\\') || path.starts_with('/') {
        return Err(ObjectStoreError::InvalidPath(path.to_string()));
    }
    let mut resolved = PathBuf::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ObjectStoreError::InvalidPath(path.to_string()));
        }
        resolved.push(segment);
    }
    Ok(resolved)
}

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FsObjectStore {
    /// Create the store, making the base directory if missing.
    ///
    /// `public_base_url` is the address prefix under which stored objects
    /// are served (e.g. `http://localhost:8080/assets`).
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, ObjectStoreError> {
        fs::create_dir_all(&base_path).await?;

        info!(path = %base_path.display(), "Object store initialized");

        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ObjectStoreError> {
        Ok(self.base_path.join(safe_relative(path)?))
    }

    fn map_io(path: &str, e: std::io::Error) -> ObjectStoreError {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ObjectStoreError::Unauthorized(path.to_string())
            }
            std::io::ErrorKind::NotFound => ObjectStoreError::NotFound(path.to_string()),
            _ => ObjectStoreError::Io(e),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<String, ObjectStoreError> {
        if data.len() as u64 > self.max_size {
            return Err(ObjectStoreError::TooLarge {
                size: data.len() as u64,
                max: self.max_size,
            });
        }

        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::map_io(path, e))?;
        }

        fs::write(&target, data)
            .await
            .map_err(|e| Self::map_io(path, e))?;

        debug!(path, size = data.len(), "Stored object");
        Ok(format!("{}/{}", self.public_base_url, path))
    }

    async fn get(&self, path: &str) -> Result<Bytes, ObjectStoreError> {
        let target = self.resolve(path)?;
        let data = fs::read(&target)
            .await
            .map_err(|e| Self::map_io(path, e))?;

        debug!(path, size = data.len(), "Retrieved object");
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &str) -> Result<(), ObjectStoreError> {
        let target = self.resolve(path)?;
        fs::remove_file(&target)
            .await
            .map_err(|e| Self::map_io(path, e))?;

        debug!(path, "Deleted object");
        Ok(())
    }
}
