//! The synced collection layer.
//!
//! [`SyncedStore`] wraps any [`RemoteCollection`] and gives every
//! subscriber the same view: the full namespace snapshot, re-sorted by
//! `createdAt` descending on every emission.  Records missing
//! `createdAt` sort after all dated records; ties break by first-seen
//! insertion sequence, which the store tracks itself so the order is
//! deterministic regardless of backend.
//!
//! A subscription delivers the current snapshot immediately, then one
//! snapshot per committed change.  Listener-level faults are reported
//! through the `on_error` callback, after which the subscription is dead
//! and must be re-established by the caller -- there is no automatic
//! reconnect.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use manch_shared::{Namespace, Record, RecordKey};

use crate::error::{Result, StoreError};
use crate::remote::{Document, RemoteCollection};

/// First-seen sequence numbers per namespace, shared by all subscribers
/// so the undated-record tiebreak is stable across emissions.
#[derive(Default)]
struct InsertionIndex {
    next: u64,
    seen: HashMap<RecordKey, u64>,
}

impl InsertionIndex {
    fn rank(&mut self, key: RecordKey) -> u64 {
        let next = &mut self.next;
        *self.seen.entry(key).or_insert_with(|| {
            let rank = *next;
            *next += 1;
            rank
        })
    }
}

/// Live, ordered mirror of a remote keyed collection.
#[derive(Clone)]
pub struct SyncedStore {
    remote: Arc<dyn RemoteCollection>,
    order: Arc<Mutex<HashMap<Namespace, InsertionIndex>>>,
}

impl SyncedStore {
    pub fn new(remote: Arc<dyn RemoteCollection>) -> Self {
        Self {
            remote,
            order: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Sort documents into the canonical emission order and project them
    /// to record views.
    fn order_documents(&self, namespace: &Namespace, documents: Vec<Document>) -> Vec<Record> {
        let mut ranked: Vec<(Record, u64)> = {
            let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
            let index = order.entry(namespace.clone()).or_default();
            documents
                .into_iter()
                .map(|doc| {
                    let rank = index.rank(doc.key);
                    (Record::from_document(doc.key, &doc.body), rank)
                })
                .collect()
        };

        ranked.sort_by(|(a, rank_a), (b, rank_b)| match (a.created_at, b.created_at) {
            (Some(at_a), Some(at_b)) => at_b.cmp(&at_a).then(rank_a.cmp(rank_b)),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => rank_a.cmp(rank_b),
        });

        ranked.into_iter().map(|(record, _)| record).collect()
    }

    /// Read the current ordered snapshot once.
    pub async fn snapshot(&self, namespace: &Namespace) -> Result<Vec<Record>> {
        let documents = self.remote.snapshot(namespace).await?;
        Ok(self.order_documents(namespace, documents))
    }

    /// Fetch a single record from the current snapshot.
    pub async fn get(&self, namespace: &Namespace, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self
            .snapshot(namespace)
            .await?
            .into_iter()
            .find(|r| r.key == *key))
    }

    /// Create (`key == None`) or merge-update a record.
    ///
    /// Completion of this call and the corresponding snapshot emission
    /// are not ordered relative to each other; callers must not assume
    /// the live list already reflects the write.
    pub async fn write(
        &self,
        namespace: &Namespace,
        key: Option<RecordKey>,
        patch: Map<String, Value>,
    ) -> Result<RecordKey> {
        self.remote.write(namespace, key, patch).await
    }

    /// Remove a record.
    pub async fn delete(&self, namespace: &Namespace, key: &RecordKey) -> Result<()> {
        self.remote.delete(namespace, key).await
    }

    /// Register a continuous listener on a namespace.
    ///
    /// `on_update` receives the full ordered snapshot -- immediately on
    /// subscribe, then after every committed change.  `on_error` fires at
    /// most once, after which no further updates arrive.
    pub fn subscribe<U, E>(&self, namespace: &Namespace, mut on_update: U, on_error: E) -> Subscription
    where
        U: FnMut(Vec<Record>) + Send + 'static,
        E: FnOnce(StoreError) + Send + 'static,
    {
        let store = self.clone();
        let namespace = namespace.clone();
        let mut rx = self.remote.changes(&namespace);
        let active = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn({
            let active = active.clone();
            let mut on_error = Some(on_error);
            async move {
                let fail = |e: StoreError, on_error: &mut Option<E>| {
                    if let Some(on_error) = on_error.take() {
                        on_error(e);
                    }
                };

                match store.remote.snapshot(&namespace).await {
                    Ok(documents) => {
                        if active.load(Ordering::SeqCst) {
                            on_update(store.order_documents(&namespace, documents));
                        }
                    }
                    Err(e) => {
                        fail(e, &mut on_error);
                        return;
                    }
                }

                loop {
                    match rx.recv().await {
                        Ok(documents) => {
                            if !active.load(Ordering::SeqCst) {
                                return;
                            }
                            on_update(store.order_documents(&namespace, documents));
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // at-least-once: catch back up with a fresh
                            // full snapshot instead of dying
                            debug!(namespace = %namespace, skipped, "listener lagged, refetching");
                            match store.remote.snapshot(&namespace).await {
                                Ok(documents) => {
                                    if !active.load(Ordering::SeqCst) {
                                        return;
                                    }
                                    on_update(store.order_documents(&namespace, documents));
                                }
                                Err(e) => {
                                    fail(e, &mut on_error);
                                    return;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            fail(StoreError::SubscriptionClosed, &mut on_error);
                            return;
                        }
                    }
                }
            }
        });

        Subscription {
            active,
            handle: task,
        }
    }
}

/// Handle to a live subscription.
///
/// [`unsubscribe`](Subscription::unsubscribe) is idempotent; dropping the
/// handle also stops delivery.
pub struct Subscription {
    active: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop further `on_update` calls.  Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::tree::TreeStore;

    fn ns(name: &str) -> Namespace {
        Namespace::parse(name).unwrap()
    }

    fn patch(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    fn tree_store() -> SyncedStore {
        SyncedStore::new(Arc::new(TreeStore::new()))
    }

    /// Subscribe with an mpsc bridge so tests can await snapshots.
    fn collect(
        store: &SyncedStore,
        namespace: &Namespace,
    ) -> (Subscription, mpsc::UnboundedReceiver<Vec<Record>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = store.subscribe(
            namespace,
            move |snapshot| {
                let _ = tx.send(snapshot);
            },
            |_| {},
        );
        (sub, rx)
    }

    #[tokio::test]
    async fn create_round_trip_appears_in_next_snapshot() {
        let store = tree_store();
        let banners = ns("banners");
        let (_sub, mut rx) = collect(&store, &banners);

        // initial (empty) snapshot arrives on subscribe
        let initial = rx.recv().await.unwrap();
        assert!(initial.is_empty());

        let key = store
            .write(&banners, None, patch(r#"{"title": "A"}"#))
            .await
            .unwrap();

        let next = rx.recv().await.unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].key, key);
        assert_eq!(next[0].field("title"), Some("A"));
    }

    #[tokio::test]
    async fn snapshots_order_created_at_descending() {
        let store = tree_store();
        let news = ns("news");

        for (title, at) in [
            ("t1", "2024-01-01T00:00:00Z"),
            ("t2", "2024-02-01T00:00:00Z"),
            ("t3", "2024-03-01T00:00:00Z"),
        ] {
            store
                .write(
                    &news,
                    None,
                    patch(&format!(r#"{{"title": "{title}", "createdAt": "{at}"}}"#)),
                )
                .await
                .unwrap();
        }

        let titles: Vec<_> = store
            .snapshot(&news)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.field("title").unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn undated_records_sort_last_in_first_seen_order() {
        let store = tree_store();
        let works = ns("works");

        store
            .write(&works, None, patch(r#"{"title": "undated-a"}"#))
            .await
            .unwrap();
        store
            .write(
                &works,
                None,
                patch(r#"{"title": "dated", "createdAt": "2024-05-01T00:00:00Z"}"#),
            )
            .await
            .unwrap();
        store
            .write(&works, None, patch(r#"{"title": "undated-b"}"#))
            .await
            .unwrap();

        let titles: Vec<_> = store
            .snapshot(&works)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.field("title").unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["dated", "undated-a", "undated-b"]);

        // the tiebreak holds on re-emission
        let again: Vec<_> = store
            .snapshot(&works)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.field("title").unwrap().to_string())
            .collect();
        assert_eq!(again, titles);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_stops_updates() {
        let store = tree_store();
        let banners = ns("banners");
        let (sub, mut rx) = collect(&store, &banners);

        let _ = rx.recv().await.unwrap();

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());

        store
            .write(&banners, None, patch(r#"{"title": "late"}"#))
            .await
            .unwrap();

        // the sender half lived in the aborted task, so the channel ends
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_feed_reports_on_error_once() {
        /// Backend whose change feed is closed from the start.
        struct ClosedFeed;

        #[async_trait]
        impl RemoteCollection for ClosedFeed {
            async fn snapshot(&self, _namespace: &Namespace) -> Result<Vec<Document>> {
                Ok(Vec::new())
            }

            async fn write(
                &self,
                _namespace: &Namespace,
                _key: Option<RecordKey>,
                _patch: Map<String, Value>,
            ) -> Result<RecordKey> {
                Ok(RecordKey::new())
            }

            async fn delete(&self, _namespace: &Namespace, _key: &RecordKey) -> Result<()> {
                Ok(())
            }

            fn changes(&self, _namespace: &Namespace) -> broadcast::Receiver<Vec<Document>> {
                broadcast::channel(1).1
            }
        }

        let store = SyncedStore::new(Arc::new(ClosedFeed));
        let (err_tx, mut err_rx) = mpsc::unbounded_channel();

        let _sub = store.subscribe(
            &ns("banners"),
            |_| {},
            move |e| {
                let _ = err_tx.send(e);
            },
        );

        let err = err_rx.recv().await.unwrap();
        assert!(matches!(err, StoreError::SubscriptionClosed));
        // the error callback is consumed; the channel ends after one report
        assert!(err_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn get_finds_single_record() {
        let store = tree_store();
        let banners = ns("banners");

        let key = store
            .write(&banners, None, patch(r#"{"title": "A"}"#))
            .await
            .unwrap();

        let record = store.get(&banners, &key).await.unwrap().unwrap();
        assert_eq!(record.field("title"), Some("A"));
        assert!(store
            .get(&banners, &RecordKey::new())
            .await
            .unwrap()
            .is_none());
    }
}
