//! Asset sources handed to the uploader.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{MediaError, Result};

enum AssetPayload {
    Bytes(Bytes),
    File(PathBuf),
}

/// A file selected for upload: name, MIME type, size, and the payload
/// (either in-memory bytes or a path read lazily at upload time).
pub struct AssetSource {
    file_name: String,
    mime_type: String,
    size_bytes: u64,
    payload: AssetPayload,
}

impl AssetSource {
    /// Source backed by in-memory bytes (e.g. a multipart upload part).
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes: data.len() as u64,
            payload: AssetPayload::Bytes(data),
        }
    }

    /// Source backed by a file on disk.  The size is captured now; the
    /// contents are read when the upload runs.
    pub async fn from_path(path: impl AsRef<Path>, mime_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| MediaError::AssetUnreadable(format!("{}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            file_name,
            mime_type: mime_type.into(),
            size_bytes: meta.len(),
            payload: AssetPayload::File(path.to_path_buf()),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Extension of the original file name, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name).extension().and_then(|e| e.to_str())
    }

    /// Read the full payload.  Failure here is [`MediaError::AssetUnreadable`].
    pub async fn read(&self) -> Result<Bytes> {
        match &self.payload {
            AssetPayload::Bytes(data) => Ok(data.clone()),
            AssetPayload::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| MediaError::AssetUnreadable(format!("{}: {e}", path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_path_missing_file_is_unreadable() {
        let err = AssetSource::from_path("/no/such/file.png", "image/png")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MediaError::AssetUnreadable(_)));
    }

    #[test]
    fn extension_comes_from_original_name() {
        let source = AssetSource::from_bytes("poster.final.PNG", "image/png", vec![1u8, 2]);
        assert_eq!(source.extension(), Some("PNG"));
        assert_eq!(source.size_bytes(), 2);
    }
}
