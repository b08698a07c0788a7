use thiserror::Error;

/// Errors produced by the store layer.
///
/// The first four variants are the remote fault taxonomy shared by every
/// backend flavor.  None of them is recovered here: a failed write or
/// delete is considered not applied, and retries are user-initiated.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The remote store rejected the caller's credentials.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The remote store is out of space.
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// Connectivity to the remote store was lost.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The operation was canceled before committing.
    #[error("Operation canceled")]
    Canceled,

    /// A query expected exactly one record but found none.
    #[error("Record not found")]
    NotFound,

    /// The backend closed the change feed; the subscription is dead and
    /// must be re-established by the caller.
    #[error("Subscription closed by the backend")]
    SubscriptionClosed,

    /// A stored document body failed to parse.
    #[error("Invalid document body: {0}")]
    InvalidDocument(String),

    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        // A full disk is the one SQLite fault that maps onto the shared
        // remote taxonomy; everything else stays a database error.
        if let rusqlite::Error::SqliteFailure(inner, _) = &e {
            if inner.code == rusqlite::ErrorCode::DiskFull {
                return StoreError::QuotaExceeded;
            }
        }
        StoreError::Sqlite(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
