//! Pre-upload file validation.
//!
//! Pure and synchronous; always runs before any network call so a bad
//! file never reaches the object store.

use manch_shared::constants::{IMAGE_MIME_TYPES, MAX_IMAGE_SIZE, PDF_MIME_TYPES};

use crate::error::{MediaError, Result};
use crate::source::AssetSource;

/// What a screen accepts for its asset field.
#[derive(Debug, Clone, Copy)]
pub struct UploadConstraints {
    /// MIME allow-list, matched case-insensitively.
    pub allowed_mime_types: &'static [&'static str],
    /// Size ceiling in bytes; `None` means unbounded.
    pub max_size_bytes: Option<u64>,
}

impl UploadConstraints {
    /// JPEG/PNG/GIF/WebP up to 5 MiB.
    pub const fn images() -> Self {
        Self {
            allowed_mime_types: IMAGE_MIME_TYPES,
            max_size_bytes: Some(MAX_IMAGE_SIZE),
        }
    }

    /// PDF documents, no size ceiling.
    pub const fn pdf() -> Self {
        Self {
            allowed_mime_types: PDF_MIME_TYPES,
            max_size_bytes: None,
        }
    }
}

/// Check a source against the constraints.
pub fn validate(source: &AssetSource, constraints: &UploadConstraints) -> Result<()> {
    let mime = source.mime_type();
    let allowed = constraints
        .allowed_mime_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(mime));
    if !allowed {
        return Err(MediaError::InvalidType {
            mime: mime.to_string(),
        });
    }

    if let Some(max) = constraints.max_size_bytes {
        if source.size_bytes() > max {
            return Err(MediaError::TooLarge {
                size: source.size_bytes(),
                max,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(size: usize) -> AssetSource {
        AssetSource::from_bytes("photo.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn rejects_mime_outside_allow_list() {
        let source = AssetSource::from_bytes("script.svg", "image/svg+xml", vec![0u8; 10]);
        let err = validate(&source, &UploadConstraints::images()).err().unwrap();
        assert!(matches!(err, MediaError::InvalidType { .. }));
    }

    #[test]
    fn mime_match_is_case_insensitive() {
        let source = AssetSource::from_bytes("photo.png", "IMAGE/PNG", vec![0u8; 10]);
        assert!(validate(&source, &UploadConstraints::images()).is_ok());
    }

    #[test]
    fn rejects_oversize_file() {
        let source = image(6 * 1024 * 1024);
        let err = validate(&source, &UploadConstraints::images()).err().unwrap();
        assert!(matches!(err, MediaError::TooLarge { .. }));
    }

    #[test]
    fn accepts_file_within_limits() {
        assert!(validate(&image(1024), &UploadConstraints::images()).is_ok());
    }

    #[test]
    fn pdf_constraints_are_unbounded() {
        let source = AssetSource::from_bytes(
            "report.pdf",
            "application/pdf",
            vec![0u8; 10 * 1024 * 1024],
        );
        assert!(validate(&source, &UploadConstraints::pdf()).is_ok());
    }
}
