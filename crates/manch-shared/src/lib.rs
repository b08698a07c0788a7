//! # manch-shared
//!
//! Domain types shared by every Manch crate: record keys and namespaces,
//! the [`Record`] / [`AssetDescriptor`] data model, the declared field
//! schema consumed by the form renderer and the lifecycle validator, and
//! shared constants.

pub mod constants;
pub mod record;
pub mod schema;
pub mod types;

pub use record::{AssetDescriptor, Record, UploadMethod};
pub use schema::{FieldKind, FieldSpec};
pub use types::{Namespace, RecordKey};
