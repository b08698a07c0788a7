//! Record and asset data model.
//!
//! Records travel as flat JSON documents: every scalar key is a form
//! field except the reserved keys [`KEY_ASSET`], [`KEY_CREATED_AT`] and
//! [`KEY_UPDATED_AT`].  Parsing is deliberately lenient -- documents
//! written by older tooling may lack timestamps or carry non-string
//! scalars, and must still load.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RecordKey;

/// Reserved document key holding the embedded [`AssetDescriptor`].
pub const KEY_ASSET: &str = "asset";
/// Reserved document key holding the creation timestamp (RFC-3339).
pub const KEY_CREATED_AT: &str = "createdAt";
/// Reserved document key holding the last-update timestamp (RFC-3339).
pub const KEY_UPDATED_AT: &str = "updatedAt";

/// How an asset ended up addressable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// Stored in the primary object store; `path` identifies the object.
    Primary,
    /// Inlined as a self-contained data URI after a primary-store failure.
    Inline,
}

/// Result of any upload: a uniform descriptor regardless of whether the
/// bytes landed in the primary object store or were inlined.
///
/// Invariant: `path` is `Some` iff `upload_method == Primary`.  The
/// constructors below are the only way call sites build one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Fetchable address, or a self-contained data URI when inlined.
    pub url: String,
    /// Object-store path; `None` for inlined assets.
    pub path: Option<String>,
    /// File name as supplied by the user.
    pub original_file_name: String,
    pub upload_method: UploadMethod,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl AssetDescriptor {
    /// Descriptor for an object that landed in the primary store.
    pub fn primary(
        url: String,
        path: String,
        original_file_name: String,
        size_bytes: u64,
        mime_type: String,
    ) -> Self {
        Self {
            url,
            path: Some(path),
            original_file_name,
            upload_method: UploadMethod::Primary,
            size_bytes,
            mime_type,
        }
    }

    /// Descriptor for an asset inlined as a data URI.
    pub fn inline(
        data_uri: String,
        original_file_name: String,
        size_bytes: u64,
        mime_type: String,
    ) -> Self {
        Self {
            url: data_uri,
            path: None,
            original_file_name,
            upload_method: UploadMethod::Inline,
            size_bytes,
            mime_type,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.upload_method == UploadMethod::Primary
    }
}

/// One entity in a collection.
///
/// The synced store owns the canonical in-memory copy; the remote backend
/// owns the durable copy; UI layers hold only this read-only projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub key: RecordKey,
    /// Scalar form fields, keyed by schema field name.
    pub fields: BTreeMap<String, String>,
    /// Zero-or-one embedded asset.
    pub asset: Option<AssetDescriptor>,
    /// `None` for records written without a timestamp; such records sort
    /// after all dated ones.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Build a record view from a raw document body.
    ///
    /// Unknown object/array values are skipped; non-string scalars are
    /// coerced to their display form; malformed timestamps and asset
    /// blocks load as absent.
    pub fn from_document(key: RecordKey, body: &Map<String, Value>) -> Self {
        let mut fields = BTreeMap::new();
        let mut asset = None;
        let mut created_at = None;
        let mut updated_at = None;

        for (name, value) in body {
            match name.as_str() {
                KEY_ASSET => {
                    asset = serde_json::from_value(value.clone()).ok();
                }
                KEY_CREATED_AT => created_at = parse_timestamp(value),
                KEY_UPDATED_AT => updated_at = parse_timestamp(value),
                _ => {
                    if let Some(text) = scalar_to_string(value) {
                        fields.insert(name.clone(), text);
                    }
                }
            }
        }

        Self {
            key,
            fields,
            asset,
            created_at,
            updated_at,
        }
    }

    /// Fetch one scalar field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_constructors_uphold_path_invariant() {
        let primary = AssetDescriptor::primary(
            "https://assets.example/banners/1.png".into(),
            "banners/1.png".into(),
            "photo.png".into(),
            1024,
            "image/png".into(),
        );
        assert!(primary.is_primary());
        assert!(primary.path.is_some());

        let inline = AssetDescriptor::inline(
            "data:image/png;base64,AAAA".into(),
            "photo.png".into(),
            1024,
            "image/png".into(),
        );
        assert!(!inline.is_primary());
        assert!(inline.path.is_none());
    }

    #[test]
    fn lenient_document_parsing() {
        let body: Map<String, Value> = serde_json::from_str(
            r#"{
                "title": "बॅनर १",
                "position": 3,
                "active": true,
                "createdAt": "2024-06-01T10:00:00Z",
                "updatedAt": "not-a-date",
                "nested": {"ignored": true}
            }"#,
        )
        .unwrap();

        let record = Record::from_document(RecordKey::new(), &body);
        assert_eq!(record.field("title"), Some("बॅनर १"));
        assert_eq!(record.field("position"), Some("3"));
        assert_eq!(record.field("active"), Some("true"));
        assert!(record.field("nested").is_none());
        assert!(record.created_at.is_some());
        assert!(record.updated_at.is_none());
        assert!(record.asset.is_none());
    }

    #[test]
    fn asset_round_trips_through_document_json() {
        let descriptor = AssetDescriptor::primary(
            "https://assets.example/news/2.jpg".into(),
            "news/2.jpg".into(),
            "press.jpg".into(),
            2048,
            "image/jpeg".into(),
        );

        let mut body = Map::new();
        body.insert(
            KEY_ASSET.to_string(),
            serde_json::to_value(&descriptor).unwrap(),
        );

        let record = Record::from_document(RecordKey::new(), &body);
        assert_eq!(record.asset, Some(descriptor));
    }
}
