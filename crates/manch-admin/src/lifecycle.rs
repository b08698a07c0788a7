//! Create/update/delete as one logical operation.
//!
//! `save` validates, uploads, and writes in that order, so every
//! user-correctable failure aborts before the record is touched.  Asset
//! cleanup (the old object on replacement, the object on delete) is
//! best-effort: failures are logged and never block the record
//! operation.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use manch_media::{validate, AssetSource, ResilientUploader};
use manch_shared::record::{KEY_ASSET, KEY_CREATED_AT, KEY_UPDATED_AT};
use manch_shared::{Record, RecordKey};
use manch_store::SyncedStore;

use crate::error::{AdminError, Result};
use crate::screens::ScreenConfig;

/// Orchestrates record writes and deletes against the synced store,
/// including pre-write asset upload and pre-delete asset cleanup.
#[derive(Clone)]
pub struct RecordLifecycleManager {
    store: SyncedStore,
    uploader: ResilientUploader,
}

impl RecordLifecycleManager {
    pub fn new(store: SyncedStore, uploader: ResilientUploader) -> Self {
        Self { store, uploader }
    }

    /// The underlying synced store, for snapshots and subscriptions.
    pub fn store(&self) -> &SyncedStore {
        &self.store
    }

    /// Create (`key == None`) or update a record.
    ///
    /// The returned record is this operation's view of the result; the
    /// live list updates asynchronously through the subscription stream,
    /// and callers must not assume it already reflects the write.
    pub async fn save(
        &self,
        screen: &ScreenConfig,
        key: Option<RecordKey>,
        fields: BTreeMap<String, String>,
        file: Option<AssetSource>,
    ) -> Result<Record> {
        let missing: Vec<String> = screen
            .fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| fields.get(f.name).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AdminError::IncompleteInput(missing));
        }

        let namespace = screen.collection();

        let descriptor = match file {
            Some(source) => {
                let Some(kind) = screen.asset else {
                    return Err(AdminError::UnsupportedAsset);
                };
                validate(&source, &kind.constraints())?;

                // a replaced asset's primary object is released first;
                // failure must not block the new write
                if let Some(key) = key {
                    if let Some(existing) = self.store.get(&namespace, &key).await? {
                        if let Some(old) = existing.asset.as_ref().filter(|a| a.is_primary()) {
                            if let Some(path) = old.path.as_deref() {
                                if let Err(e) = self.uploader.delete_object(path).await {
                                    warn!(
                                        namespace = %namespace,
                                        path,
                                        error = %e,
                                        "Failed to delete replaced asset"
                                    );
                                }
                            }
                        }
                    }
                }

                Some(self.uploader.upload(&source, &namespace).await?)
            }
            None => None,
        };

        let mut patch = Map::new();
        for (name, value) in fields {
            patch.insert(name, Value::String(value));
        }
        if let Some(descriptor) = &descriptor {
            patch.insert(
                KEY_ASSET.to_string(),
                serde_json::to_value(descriptor)
                    .map_err(|e| manch_store::StoreError::InvalidDocument(e.to_string()))?,
            );
        }

        let now = Utc::now().to_rfc3339();
        if key.is_none() {
            patch.insert(KEY_CREATED_AT.to_string(), Value::String(now.clone()));
        }
        patch.insert(KEY_UPDATED_AT.to_string(), Value::String(now));

        let written = self.store.write(&namespace, key, patch.clone()).await?;

        info!(
            namespace = %namespace,
            key = %written,
            created = key.is_none(),
            has_asset = descriptor.is_some(),
            "Record saved"
        );

        Ok(self
            .store
            .get(&namespace, &written)
            .await?
            .unwrap_or_else(|| Record::from_document(written, &patch)))
    }

    /// Delete a record, releasing its primary-store asset first.
    ///
    /// Asset cleanup is best-effort; the record is deleted regardless.
    pub async fn remove(&self, screen: &ScreenConfig, record: &Record) -> Result<()> {
        let namespace = screen.collection();

        if let Some(asset) = record.asset.as_ref().filter(|a| a.is_primary()) {
            if let Some(path) = asset.path.as_deref() {
                if let Err(e) = self.uploader.delete_object(path).await {
                    warn!(
                        namespace = %namespace,
                        path,
                        error = %e,
                        "Failed to delete asset, removing record anyway"
                    );
                }
            }
        }

        self.store.delete(&namespace, &record.key).await?;

        info!(namespace = %namespace, key = %record.key, "Record removed");
        Ok(())
    }
}
