//! Declared field schemas.
//!
//! Each screen declares an ordered list of [`FieldSpec`]s.  The same list
//! drives the lifecycle validator (which fields are required) and the form
//! renderer (which fields exist, in what order, under what label), so the
//! two can never drift apart.

use serde::Serialize;

/// Input widget / validation hint for one field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Multiline,
    Date,
    Phone,
    Email,
    Url,
}

/// One declared scalar field of a screen.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    /// Document key the field is stored under.
    pub name: &'static str,
    /// Human-readable label shown by the form renderer.
    pub label: &'static str,
    pub kind: FieldKind,
    /// Required fields must be non-blank before any write is attempted.
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }
}
