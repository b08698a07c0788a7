//! # manch-admin
//!
//! The administrative layer over the synced store and the uploader: the
//! record lifecycle manager (create/update/delete as one logical
//! operation, including pre-write upload and pre-delete cleanup), the
//! screen registry that turns every content type into thin configuration,
//! the confirmation/notification surface, and the form state machine.

pub mod alerts;
pub mod form;
pub mod lifecycle;
pub mod screens;

mod error;

pub use alerts::{AlertSurface, AlertView, NoticeKind};
pub use error::AdminError;
pub use form::{reduce, FormEvent, FormState};
pub use lifecycle::RecordLifecycleManager;
pub use screens::{AssetKind, ScreenConfig};
