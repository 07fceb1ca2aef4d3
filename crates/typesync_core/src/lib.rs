//! # TypeSync Core
//!
//! Keeps content-type definitions in sync between snapshot files and a
//! live model.
//!
//! This crate provides:
//! - Canonical form and content digest of definition documents
//! - Structural diff between a target document and a live export
//! - Reconciliation of a live content type against a target definition
//! - A versioned writer that archives snapshots before replacing them
//! - A batch runner that imports and exports whole snapshot trees
//!
//! ## Flow
//!
//! ```text
//! snapshot file ──parse──▶ Definition ──reconcile──▶ ContentType ──save──▶ repository
//!       ▲                                                  │
//!       └──────────── VersionedWriter ◀──export────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use typesync_core::{diff, export_content_type, ContentTypeRepository, MemoryRepository};
//! use typesync_codec::from_json_str;
//!
//! let repo = MemoryRepository::new();
//! let page = repo.create("page", "Page").unwrap();
//! let live = export_content_type(&page, &repo);
//!
//! let target = from_json_str(r#"{"Info": {"Alias": "page", "Name": "Landing"}}"#).unwrap();
//! let report = diff::diff(&target, &live, None).unwrap();
//! assert!(report.info_changed);
//! assert!(!report.parent_changed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod canonical;
mod config;
mod definition;
pub mod diff;
mod document;
mod error;
mod export;
mod hash;
mod layout;
mod model;
mod reconcile;
mod repository;
mod sync;
mod watch;
mod writer;

pub use canonical::canonicalize;
pub use config::SyncSettings;
pub use definition::{Definition, GroupDefinition, PropertyDefinition};
pub use diff::DiffReport;
pub use error::{CoreError, CoreResult};
pub use export::{export_content_type, parent_alias, sync_path};
pub use hash::{digest, digest_canonical, digest_fields, digest_str, DIGEST_HEX_LEN};
pub use layout::{
    scrub_file_name, type_folder, SnapshotPath, SyncLayout, ARCHIVE_STAMP_FORMAT,
    ARCHIVE_STAMP_LEN,
};
pub use model::{
    ContentType, ContentTypeId, DataTypeDefinition, PropertyGroup, PropertyType, ROOT_PATH,
};
pub use reconcile::{PropertyError, ReconcilePolicy, ReconcileReport, Reconciler};
pub use repository::{
    ContentTypeRepository, DataTypeRepository, EditorKindTable, MemoryRepository,
};
pub use sync::{
    definition_changed, ItemOutcome, Outcome, StartupReport, SyncRunner, TypeKind,
    DEFINITION_FILE, DOCUMENT_TYPE, MEDIA_TYPE,
};
pub use watch::{PauseGuard, WatchGate};
pub use writer::{Clock, ManualClock, SystemClock, VersionPolicy, VersionedWriter, WriterEvent};

// Re-export the document tree so callers need not depend on the codec crate
pub use typesync_codec::Value;

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
