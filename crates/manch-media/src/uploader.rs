//! Upload with inline fallback.
//!
//! The primary store is attempted exactly once.  Any primary fault --
//! authorization, quota, network, canceled, I/O -- is logged and recovered
//! by inlining the payload as a data URI; it never reaches the caller.
//! The only fatal failure is a source that cannot be read at all.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};

use manch_shared::{AssetDescriptor, Namespace};

use crate::error::{ObjectStoreError, Result};
use crate::inline::to_data_uri;
use crate::object_store::ObjectStore;
use crate::source::AssetSource;

/// Uploads assets to the primary store, falling back to inline encoding.
#[derive(Clone)]
pub struct ResilientUploader {
    store: Arc<dyn ObjectStore>,
}

impl ResilientUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload `source` under `folder`, returning a uniform descriptor.
    ///
    /// The stored object name is collision-resistant: millisecond
    /// timestamp plus a random suffix, preserving the original extension.
    /// A primary object may be left behind if the caller later discards
    /// the descriptor; callers must treat this as atomic-or-fallback.
    pub async fn upload(&self, source: &AssetSource, folder: &Namespace) -> Result<AssetDescriptor> {
        let data = source.read().await?;
        let path = format!("{}/{}", folder, object_name(source));

        match self.store.put(&path, &data).await {
            Ok(url) => {
                info!(path = %path, size = data.len(), "Asset stored in primary store");
                Ok(AssetDescriptor::primary(
                    url,
                    path,
                    source.file_name().to_string(),
                    data.len() as u64,
                    source.mime_type().to_string(),
                ))
            }
            Err(e) => {
                warn!(
                    path = %path,
                    error = %e,
                    "Primary store upload failed, inlining asset"
                );
                Ok(AssetDescriptor::inline(
                    to_data_uri(source.mime_type(), &data),
                    source.file_name().to_string(),
                    data.len() as u64,
                    source.mime_type().to_string(),
                ))
            }
        }
    }

    /// Remove a previously stored primary object.
    ///
    /// Call sites treat failure as non-fatal cleanup: log and proceed.
    pub async fn delete_object(&self, path: &str) -> Result<(), ObjectStoreError> {
        self.store.delete(path).await
    }
}

fn object_name(source: &AssetSource) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    match source.extension() {
        Some(ext) => format!("{}_{}.{}", Utc::now().timestamp_millis(), suffix, ext),
        None => format!("{}_{}", Utc::now().timestamp_millis(), suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::TempDir;

    use crate::object_store::FsObjectStore;

    /// Primary store that rejects everything, as an unreachable bucket would.
    struct DownStore;

    #[async_trait]
    impl ObjectStore for DownStore {
        async fn put(&self, path: &str, _data: &[u8]) -> Result<String, ObjectStoreError> {
            Err(ObjectStoreError::Unauthorized(path.to_string()))
        }

        async fn get(&self, path: &str) -> Result<Bytes, ObjectStoreError> {
            Err(ObjectStoreError::NotFound(path.to_string()))
        }

        async fn delete(&self, path: &str) -> Result<(), ObjectStoreError> {
            Err(ObjectStoreError::Unauthorized(path.to_string()))
        }
    }

    fn banners() -> Namespace {
        Namespace::parse("banners").unwrap()
    }

    #[tokio::test]
    async fn primary_success_yields_primary_descriptor() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(
            dir.path().to_path_buf(),
            "http://localhost:8080/assets",
            1024 * 1024,
        )
        .await
        .unwrap();
        let uploader = ResilientUploader::new(Arc::new(store));

        let source = AssetSource::from_bytes("photo.png", "image/png", vec![1u8, 2, 3]);
        let descriptor = uploader.upload(&source, &banners()).await.unwrap();

        assert!(descriptor.is_primary());
        let path = descriptor.path.as_deref().unwrap();
        assert!(path.starts_with("banners/"));
        assert!(path.ends_with(".png"));
        assert!(descriptor.url.starts_with("http://localhost:8080/assets/banners/"));
        assert_eq!(descriptor.size_bytes, 3);
        assert_eq!(descriptor.original_file_name, "photo.png");
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_inline() {
        let uploader = ResilientUploader::new(Arc::new(DownStore));

        let source = AssetSource::from_bytes("photo.png", "image/png", vec![1u8, 2, 3]);
        let descriptor = uploader.upload(&source, &banners()).await.unwrap();

        assert!(!descriptor.is_primary());
        assert!(descriptor.path.is_none());
        assert!(descriptor.url.starts_with("data:image/png;base64,"));
        assert_eq!(descriptor.mime_type, "image/png");
    }

    #[tokio::test]
    async fn unreadable_source_is_fatal_even_with_working_store() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.png");
        tokio::fs::write(&file, b"soon gone").await.unwrap();
        let source = AssetSource::from_path(&file, "image/png").await.unwrap();
        tokio::fs::remove_file(&file).await.unwrap();

        let store = FsObjectStore::new(
            dir.path().join("objects"),
            "http://localhost:8080/assets",
            1024 * 1024,
        )
        .await
        .unwrap();
        let uploader = ResilientUploader::new(Arc::new(store));

        let err = uploader.upload(&source, &banners()).await.err().unwrap();
        assert!(matches!(err, crate::MediaError::AssetUnreadable(_)));
    }
}
