use thiserror::Error;

/// Errors produced by the validation and upload layer.
///
/// All three variants are user-correctable: the operation aborts before
/// any record write and the caller surfaces the message as a warning.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The file's MIME type is outside the allow-list.
    #[error("Unsupported file type: {mime}")]
    InvalidType { mime: String },

    /// The file exceeds the configured size ceiling.
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// The asset source could not be read at all.  The only fatal upload
    /// failure -- primary-store faults fall back to inlining instead.
    #[error("Could not read file: {0}")]
    AssetUnreadable(String),
}

/// Faults raised by a primary object store.
///
/// The resilient uploader recovers from every one of these by inlining;
/// lifecycle cleanup call sites log and swallow them.
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Operation canceled")]
    Canceled,

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = MediaError> = std::result::Result<T, E>;
