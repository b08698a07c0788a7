//! SQLite-backed document-query backend.
//!
//! The second remote flavor: documents live in one table, snapshots are
//! produced per-query with an ordering clause (`created_at` descending,
//! insertion sequence as the tiebreak), and every committed change
//! re-runs the query and broadcasts the result.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::params;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use manch_shared::record::KEY_CREATED_AT;
use manch_shared::{Namespace, RecordKey};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::remote::{merge_patch, Document, RemoteCollection};

const CHANNEL_CAPACITY: usize = 64;

/// Document-query store over a [`Database`].
pub struct DocumentStore {
    db: Mutex<Database>,
    channels: Mutex<HashMap<Namespace, broadcast::Sender<Vec<Document>>>>,
}

impl DocumentStore {
    pub fn open(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, namespace: &Namespace) -> broadcast::Sender<Vec<Document>> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(namespace.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Run the namespace query and parse every row.
    fn query_snapshot(db: &Database, namespace: &Namespace) -> Result<Vec<Document>> {
        let mut stmt = db.conn().prepare(
            "SELECT key, body FROM documents
             WHERE namespace = ?1
             ORDER BY created_at DESC, seq ASC",
        )?;

        let rows = stmt.query_map(params![namespace.as_str()], |row| {
            let key: String = row.get(0)?;
            let body: String = row.get(1)?;
            Ok((key, body))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (key, body) = row?;
            let key = RecordKey::parse(&key)?;
            let body: Map<String, Value> = serde_json::from_str(&body)
                .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
            documents.push(Document { key, body });
        }
        Ok(documents)
    }

    fn next_seq(db: &Database, namespace: &Namespace) -> Result<i64> {
        let seq: i64 = db.conn().query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM documents WHERE namespace = ?1",
            params![namespace.as_str()],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Reload the query result after a commit and push it to listeners.
    fn emit(&self, db: &Database, namespace: &Namespace) -> Result<()> {
        let snapshot = Self::query_snapshot(db, namespace)?;
        // send fails when no listener is live; that is fine
        let _ = self.sender(namespace).send(snapshot);
        Ok(())
    }
}

fn created_at_column(body: &Map<String, Value>) -> Option<String> {
    body.get(KEY_CREATED_AT)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl RemoteCollection for DocumentStore {
    async fn snapshot(&self, namespace: &Namespace) -> Result<Vec<Document>> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        Self::query_snapshot(&db, namespace)
    }

    async fn write(
        &self,
        namespace: &Namespace,
        key: Option<RecordKey>,
        patch: Map<String, Value>,
    ) -> Result<RecordKey> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());

        let key = match key {
            Some(key) => {
                let existing: Option<String> = db
                    .conn()
                    .query_row(
                        "SELECT body FROM documents WHERE namespace = ?1 AND key = ?2",
                        params![namespace.as_str(), key.to_string()],
                        |row| row.get(0),
                    )
                    .map(Some)
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(None),
                        other => Err(StoreError::from(other)),
                    })?;

                match existing {
                    Some(raw) => {
                        let mut body: Map<String, Value> = serde_json::from_str(&raw)
                            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
                        merge_patch(&mut body, patch);

                        db.conn().execute(
                            "UPDATE documents SET body = ?3, created_at = ?4
                             WHERE namespace = ?1 AND key = ?2",
                            params![
                                namespace.as_str(),
                                key.to_string(),
                                serde_json::to_string(&body)
                                    .map_err(|e| StoreError::InvalidDocument(e.to_string()))?,
                                created_at_column(&body),
                            ],
                        )?;
                    }
                    // writing to an unseen key creates the document there
                    None => {
                        let seq = Self::next_seq(&db, namespace)?;
                        db.conn().execute(
                            "INSERT INTO documents (namespace, key, body, created_at, seq)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![
                                namespace.as_str(),
                                key.to_string(),
                                serde_json::to_string(&patch)
                                    .map_err(|e| StoreError::InvalidDocument(e.to_string()))?,
                                created_at_column(&patch),
                                seq,
                            ],
                        )?;
                    }
                }
                key
            }
            None => {
                let key = RecordKey::new();
                let seq = Self::next_seq(&db, namespace)?;
                db.conn().execute(
                    "INSERT INTO documents (namespace, key, body, created_at, seq)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        namespace.as_str(),
                        key.to_string(),
                        serde_json::to_string(&patch)
                            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?,
                        created_at_column(&patch),
                        seq,
                    ],
                )?;
                key
            }
        };

        debug!(namespace = %namespace, key = %key, "document write committed");
        self.emit(&db, namespace)?;
        Ok(key)
    }

    async fn delete(&self, namespace: &Namespace, key: &RecordKey) -> Result<()> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());

        db.conn().execute(
            "DELETE FROM documents WHERE namespace = ?1 AND key = ?2",
            params![namespace.as_str(), key.to_string()],
        )?;

        debug!(namespace = %namespace, key = %key, "document delete committed");
        self.emit(&db, namespace)?;
        Ok(())
    }

    fn changes(&self, namespace: &Namespace) -> broadcast::Receiver<Vec<Document>> {
        self.sender(namespace).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ns(name: &str) -> Namespace {
        Namespace::parse(name).unwrap()
    }

    fn patch(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    fn open_store(dir: &TempDir) -> DocumentStore {
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        DocumentStore::open(db)
    }

    #[tokio::test]
    async fn create_and_reload_after_reopen() {
        let dir = TempDir::new().unwrap();
        let banners = ns("banners");

        let key = {
            let store = open_store(&dir);
            store
                .write(&banners, None, patch(r#"{"title": "x"}"#))
                .await
                .unwrap()
        };

        // a fresh handle over the same file sees the committed document
        let store = open_store(&dir);
        let snapshot = store.snapshot(&banners).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, key);
        assert_eq!(snapshot[0].body.get("title"), Some(&Value::String("x".into())));
    }

    #[tokio::test]
    async fn query_orders_created_at_descending_with_seq_tiebreak() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let news = ns("news");

        let k1 = store
            .write(&news, None, patch(r#"{"title": "1", "createdAt": "2024-01-01T00:00:00Z"}"#))
            .await
            .unwrap();
        let k3 = store
            .write(&news, None, patch(r#"{"title": "3", "createdAt": "2024-03-01T00:00:00Z"}"#))
            .await
            .unwrap();
        let k2 = store
            .write(&news, None, patch(r#"{"title": "2", "createdAt": "2024-02-01T00:00:00Z"}"#))
            .await
            .unwrap();

        let keys: Vec<_> = store
            .snapshot(&news)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec![k3, k2, k1]);
    }

    #[tokio::test]
    async fn merge_update_preserves_fields_and_emits() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let schemes = ns("schemes");
        let mut rx = store.changes(&schemes);

        let key = store
            .write(&schemes, None, patch(r#"{"title": "x", "summary": "s"}"#))
            .await
            .unwrap();
        store
            .write(&schemes, Some(key), patch(r#"{"title": "x2"}"#))
            .await
            .unwrap();

        // two commits, two snapshot emissions
        let _ = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second[0].body.get("title"), Some(&Value::String("x2".into())));
        assert_eq!(second[0].body.get("summary"), Some(&Value::String("s".into())));
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let banners = ns("banners");

        let key = store
            .write(&banners, None, patch(r#"{"title": "x"}"#))
            .await
            .unwrap();
        store.delete(&banners, &key).await.unwrap();

        assert!(store.snapshot(&banners).await.unwrap().is_empty());
    }
}
