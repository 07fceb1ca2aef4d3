//! # TypeSync Testkit
//!
//! Test utilities for TypeSync.
//!
//! This crate provides:
//! - Document builders and a seeded repository
//! - Snapshot folders backed by a temp dir or memory
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use typesync_testkit::prelude::*;
//!
//! #[test]
//! fn imports_a_page() {
//!     let repo = seeded_repository();
//!     let doc = DocumentBuilder::new("page").property("title", "textbox", "Content").build();
//!     // ... import and assert
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
