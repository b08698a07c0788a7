//! The seam to the remote keyed collection store.
//!
//! Both backend flavors -- the path-addressed live tree and the
//! SQLite-backed document-query store -- implement [`RemoteCollection`].
//! Change feeds carry the **full current snapshot** of a namespace, never
//! diffs; delivery is at-least-once and eventually consistent.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use manch_shared::{Namespace, RecordKey};

use crate::error::Result;

/// A raw document as held by a remote backend: the key plus the flat
/// JSON body, in the backend's native order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: RecordKey,
    pub body: Map<String, Value>,
}

/// Remote keyed collection store.
///
/// Writes are last-write-wins per field at the backend's discretion;
/// there is no optimistic-concurrency guard.  This is an accepted
/// limitation of the pattern, not something to paper over here.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Read the full current snapshot of a namespace.
    async fn snapshot(&self, namespace: &Namespace) -> Result<Vec<Document>>;

    /// Create a document (`key == None`, the store assigns the key) or
    /// merge-update an existing one: fields present in `patch` are
    /// written, an explicit JSON `null` removes a field, everything else
    /// is preserved.
    async fn write(
        &self,
        namespace: &Namespace,
        key: Option<RecordKey>,
        patch: Map<String, Value>,
    ) -> Result<RecordKey>;

    /// Remove a document.  Removing an absent key is a no-op.
    async fn delete(&self, namespace: &Namespace, key: &RecordKey) -> Result<()>;

    /// Continuous change feed for a namespace: one full snapshot per
    /// committed change, in commit order.
    fn changes(&self, namespace: &Namespace) -> broadcast::Receiver<Vec<Document>>;
}

/// Apply merge-update semantics to a document body.
pub(crate) fn merge_patch(body: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            body.remove(&key);
        } else {
            body.insert(key, value);
        }
    }
}
