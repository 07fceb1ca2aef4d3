//! Error types for TypeSync core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in TypeSync core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Snapshot backend error.
    #[error("storage error: {0}")]
    Storage(#[from] typesync_storage::StorageError),

    /// Document codec error.
    #[error("codec error: {0}")]
    Codec(#[from] typesync_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document does not have the shape of a definition document.
    #[error("malformed document: {message}")]
    MalformedDocument {
        /// Description of the problem.
        message: String,
    },

    /// A required field is absent or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// Dotted path of the field.
        field: String,
    },

    /// The same property alias appears in more than one group.
    #[error("property alias '{alias}' appears in both '{first_group}' and '{second_group}'")]
    DuplicateAlias {
        /// The repeated alias.
        alias: String,
        /// Group holding the first occurrence.
        first_group: String,
        /// Group holding the second occurrence.
        second_group: String,
    },

    /// The parent alias does not name a known content type.
    #[error("parent '{alias}' could not be resolved")]
    UnresolvedParent {
        /// The parent alias from the document.
        alias: String,
    },

    /// The editor kind of a property has no storage definition.
    #[error("property '{property}' uses unknown editor kind '{editor_kind}'")]
    UnknownEditorKind {
        /// Alias of the property.
        property: String,
        /// The unresolved editor kind.
        editor_kind: String,
    },

    /// A property cannot be placed because it names no group.
    #[error("property '{alias}' has no group")]
    Ungrouped {
        /// Alias of the property.
        alias: String,
    },

    /// The live model could not be saved.
    #[error("persistence failed: {message}")]
    Persistence {
        /// Description of the failure.
        message: String,
    },

    /// Settings could not be read.
    #[error("invalid settings: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed document error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a duplicate alias error.
    pub fn duplicate_alias(
        alias: impl Into<String>,
        first_group: impl Into<String>,
        second_group: impl Into<String>,
    ) -> Self {
        Self::DuplicateAlias {
            alias: alias.into(),
            first_group: first_group.into(),
            second_group: second_group.into(),
        }
    }

    /// Creates an unresolved parent error.
    pub fn unresolved_parent(alias: impl Into<String>) -> Self {
        Self::UnresolvedParent {
            alias: alias.into(),
        }
    }

    /// Creates an unknown editor kind error.
    pub fn unknown_editor_kind(
        property: impl Into<String>,
        editor_kind: impl Into<String>,
    ) -> Self {
        Self::UnknownEditorKind {
            property: property.into(),
            editor_kind: editor_kind.into(),
        }
    }

    /// Creates an ungrouped property error.
    pub fn ungrouped(alias: impl Into<String>) -> Self {
        Self::Ungrouped {
            alias: alias.into(),
        }
    }

    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a settings error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
