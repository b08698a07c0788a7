//! In-memory path-addressed live-tree backend.
//!
//! Namespaces are nodes; every committed write or delete re-emits the
//! node's complete document list to all live listeners, matching the
//! snapshot-per-node behavior of a realtime tree database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use manch_shared::{Namespace, RecordKey};

use crate::error::Result;
use crate::remote::{merge_patch, Document, RemoteCollection};

/// Change-feed buffer per namespace.  A slow listener that falls this far
/// behind refetches the full snapshot rather than erroring out.
const CHANNEL_CAPACITY: usize = 64;

/// Live-tree store.  Documents are kept in insertion order per namespace.
#[derive(Default)]
pub struct TreeStore {
    nodes: Mutex<HashMap<Namespace, Vec<Document>>>,
    channels: Mutex<HashMap<Namespace, broadcast::Sender<Vec<Document>>>>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, namespace: &Namespace) -> broadcast::Sender<Vec<Document>> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(namespace.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn emit(&self, namespace: &Namespace, snapshot: Vec<Document>) {
        // send fails when no listener is live; that is fine
        let _ = self.sender(namespace).send(snapshot);
    }

    fn current(&self, namespace: &Namespace) -> Vec<Document> {
        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteCollection for TreeStore {
    async fn snapshot(&self, namespace: &Namespace) -> Result<Vec<Document>> {
        Ok(self.current(namespace))
    }

    async fn write(
        &self,
        namespace: &Namespace,
        key: Option<RecordKey>,
        patch: Map<String, Value>,
    ) -> Result<RecordKey> {
        let (key, snapshot) = {
            let mut nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner());
            let docs = nodes.entry(namespace.clone()).or_default();

            let key = match key {
                Some(key) => {
                    let existing = docs.iter().position(|d| d.key == key);
                    match existing {
                        Some(i) => merge_patch(&mut docs[i].body, patch),
                        // writing to an unseen path creates the node there
                        None => docs.push(Document { key, body: patch }),
                    }
                    key
                }
                None => {
                    let key = RecordKey::new();
                    docs.push(Document { key, body: patch });
                    key
                }
            };

            debug!(namespace = %namespace, key = %key, "tree write committed");
            (key, docs.clone())
        };

        self.emit(namespace, snapshot);
        Ok(key)
    }

    async fn delete(&self, namespace: &Namespace, key: &RecordKey) -> Result<()> {
        let snapshot = {
            let mut nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner());
            let docs = nodes.entry(namespace.clone()).or_default();
            docs.retain(|d| d.key != *key);
            debug!(namespace = %namespace, key = %key, "tree delete committed");
            docs.clone()
        };

        self.emit(namespace, snapshot);
        Ok(())
    }

    fn changes(&self, namespace: &Namespace) -> broadcast::Receiver<Vec<Document>> {
        self.sender(namespace).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::parse(name).unwrap()
    }

    fn patch(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_key_and_emits_snapshot() {
        let store = TreeStore::new();
        let banners = ns("banners");
        let mut rx = store.changes(&banners);

        let key = store
            .write(&banners, None, patch(r#"{"title": "x"}"#))
            .await
            .unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, key);
    }

    #[tokio::test]
    async fn merge_update_preserves_other_fields() {
        let store = TreeStore::new();
        let banners = ns("banners");

        let key = store
            .write(&banners, None, patch(r#"{"title": "x", "link": "y"}"#))
            .await
            .unwrap();
        store
            .write(&banners, Some(key), patch(r#"{"title": "x2"}"#))
            .await
            .unwrap();

        let snapshot = store.snapshot(&banners).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].body.get("title"), Some(&Value::String("x2".into())));
        assert_eq!(snapshot[0].body.get("link"), Some(&Value::String("y".into())));
    }

    #[tokio::test]
    async fn delete_removes_and_absent_delete_is_noop() {
        let store = TreeStore::new();
        let banners = ns("banners");

        let key = store
            .write(&banners, None, patch(r#"{"title": "x"}"#))
            .await
            .unwrap();
        store.delete(&banners, &key).await.unwrap();
        store.delete(&banners, &key).await.unwrap();

        assert!(store.snapshot(&banners).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = TreeStore::new();
        store
            .write(&ns("banners"), None, patch(r#"{"title": "x"}"#))
            .await
            .unwrap();

        assert!(store.snapshot(&ns("schemes")).await.unwrap().is_empty());
    }
}
