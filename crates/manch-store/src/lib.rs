//! # manch-store
//!
//! The synced collection store: a live, ordered, in-memory mirror of a
//! remote keyed collection.
//!
//! The remote seam is the [`RemoteCollection`] trait with two
//! interchangeable backends -- [`TreeStore`] (path-addressed live tree,
//! snapshot-per-node) and [`DocumentStore`] (SQLite-backed document
//! queries, snapshot-per-query).  [`SyncedStore`] sits on top of either,
//! re-sorting every emission by `createdAt` descending and fanning full
//! snapshots out to subscribers.

pub mod database;
pub mod documents;
pub mod migrations;
pub mod remote;
pub mod synced;
pub mod tree;

mod error;

pub use database::Database;
pub use documents::DocumentStore;
pub use error::StoreError;
pub use remote::{Document, RemoteCollection};
pub use synced::{Subscription, SyncedStore};
pub use tree::TreeStore;
