use thiserror::Error;

/// Errors produced by the lifecycle layer.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Required fields were blank; the write was never attempted.
    #[error("Required fields missing: {}", .0.join(", "))]
    IncompleteInput(Vec<String>),

    /// A file was supplied for a screen that has no asset slot.
    #[error("This screen does not accept file uploads")]
    UnsupportedAsset,

    /// Validation or upload failure (user-correctable).
    #[error(transparent)]
    Media(#[from] manch_media::MediaError),

    /// Remote store fault; the attempted write/delete is not applied.
    #[error(transparent)]
    Store(#[from] manch_store::StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = AdminError> = std::result::Result<T, E>;
