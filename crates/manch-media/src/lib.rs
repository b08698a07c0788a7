//! # manch-media
//!
//! Asset validation and resilient upload.
//!
//! Uploads go to a primary [`ObjectStore`]; on any primary failure the
//! payload is re-encoded as a self-contained base64 data URI instead of
//! surfacing the error.  Both outcomes produce the same
//! [`manch_shared::AssetDescriptor`] shape, so callers never branch on
//! where the bytes ended up.

pub mod inline;
pub mod object_store;
pub mod source;
pub mod uploader;
pub mod validate;

mod error;

pub use error::{MediaError, ObjectStoreError};
pub use object_store::{FsObjectStore, ObjectStore};
pub use source::AssetSource;
pub use uploader::ResilientUploader;
pub use validate::{validate, UploadConstraints};
