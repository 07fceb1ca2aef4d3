//! # TypeSync Storage
//!
//! Snapshot backend trait and implementations for TypeSync.
//!
//! This crate provides the lowest-level storage abstraction for TypeSync.
//! Backends are **opaque file stores** - they do not interpret the
//! documents they store.
//!
//! ## Design Principles
//!
//! - Backends read and replace whole files, copy, remove and list
//! - No knowledge of documents, archive naming or retention
//! - Must be `Send + Sync` so a writer can be shared
//! - TypeSync core owns all layout and versioning decisions
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing, with deterministic creation order
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use typesync_storage::{SnapshotBackend, InMemoryBackend};
//! use std::path::Path;
//!
//! let backend = InMemoryBackend::new();
//! backend.create_dir_all(Path::new("sync/DocumentType")).unwrap();
//! backend.write(Path::new("sync/DocumentType/def.json"), b"{}").unwrap();
//! assert_eq!(backend.read(Path::new("sync/DocumentType/def.json")).unwrap(), b"{}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{EntryInfo, SnapshotBackend};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
