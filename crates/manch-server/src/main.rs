//! # manch-server
//!
//! HTTP API server for the Manch content administration backend.
//!
//! This binary provides:
//! - **Credential gate**: login/logout/session over a single configured
//!   admin principal
//! - **Generic CRUD** for every content screen (banners, news, schemes,
//!   ...), driven by the screen registry rather than per-screen code
//! - **Resilient uploads**: assets land in the filesystem object store,
//!   falling back to inline base64 descriptors when it fails
//! - **Live snapshot streams** (SSE) backed by the synced collection
//!   store
//! - **Asset serving** for primary-store objects

mod api;
mod auth;
mod config;
mod error;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use manch_admin::RecordLifecycleManager;
use manch_media::{FsObjectStore, ResilientUploader};
use manch_store::{Database, DocumentStore, SyncedStore};

use crate::api::AppState;
use crate::auth::AuthService;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,manch_server=debug")),
        )
        .init();

    info!("Starting Manch server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        http_addr = %config.http_addr,
        assets = %config.asset_storage_path.display(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Document database (platform data dir unless configured)
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let store = SyncedStore::new(Arc::new(DocumentStore::open(database)));

    // Object store (creates directory if missing)
    let objects = Arc::new(
        FsObjectStore::new(
            config.asset_storage_path.clone(),
            config.public_base_url.clone(),
            config.max_asset_size,
        )
        .await?,
    );
    let uploader = ResilientUploader::new(objects.clone());

    let lifecycle = RecordLifecycleManager::new(store, uploader);

    // Credential gate
    let password_digest = match config.admin_password_digest {
        Some(digest) => digest,
        None => {
            if config.admin_password == ServerConfig::default().admin_password {
                warn!("ADMIN_PASSWORD not set, using the development default");
            }
            AuthService::digest_password(&config.admin_password)
        }
    };
    let auth = Arc::new(AuthService::new(config.admin_email.clone(), password_digest));

    let app_state = AppState {
        lifecycle,
        objects,
        auth,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
