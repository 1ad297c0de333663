//! Error types for roaming-settings.

use crate::core::{Field, FieldKind};
use std::fmt;

/// Result type alias for roaming-settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when working with settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No schema field has the given name.
    #[error("Unknown setting: {0}")]
    UnknownField(String),

    /// A value of the wrong kind was supplied for a field.
    #[error("Setting '{field}' expects a {expected} value, got {found}")]
    TypeMismatch {
        /// The field being written
        field: Field,
        /// The kind declared by the schema
        expected: FieldKind,
        /// The kind of the supplied value
        found: FieldKind,
    },

    /// The backing store rejected a read, write or clear.
    #[error("Backing store error: {0}")]
    Backing(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse persisted settings.
    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    /// Change watching is not supported or failed to initialize.
    #[error("Watch error: {0}")]
    WatchError(String),

    /// Generic error for other cases.
    #[error("Settings error: {0}")]
    Other(String),
}

/// A stored value that could not be read as its field's declared type.
///
/// This is the only failure the load path can hit. The store swallows it and
/// keeps the field's previous in-memory value.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    /// The field being loaded
    pub field: Field,
    /// Display form of the rejected value
    pub raw: String,
}

impl CoercionError {
    pub(crate) fn new(field: Field, raw: impl Into<String>) -> Self {
        Self {
            field,
            raw: raw.into(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot read '{}' as {} for setting '{}'",
            self.raw,
            self.field.kind(),
            self.field
        )
    }
}

impl std::error::Error for CoercionError {}
