//! Error types for meshmux.
//!
//! Codecs report failures through [`MeshError`] internally; the boolean
//! `try_*` entry points in [`crate::io`] turn them into `false`/`None` so batch
//! callers can move on to the next file. Conversion failures are the one case
//! that always surfaces as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh interchange.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The file does not exist or its stream could not be opened.
    #[error("file not found: {path}")]
    FileNotFound {
        /// The file path.
        path: PathBuf,
    },

    /// No registered codec claims the file's extension.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension, or `(none)`.
        extension: String,
    },

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The container holds a slot the target format cannot represent.
    #[error("{format} cannot store slot '{slot}': {reason}")]
    IncompatibleSchema {
        /// Display name of the format.
        format: &'static str,
        /// Offending slot name.
        slot: String,
        /// Why the slot cannot be stored.
        reason: String,
    },

    /// A vertex record or slot operation does not match the attribute schema.
    #[error("schema mismatch: {details}")]
    SchemaMismatch {
        /// Description of the mismatch.
        details: String,
    },

    /// No converter is registered for the exact type pair.
    #[error("no attribute converter registered from {from} to {to}")]
    UnsupportedConversion {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
    },

    /// A converter for this type pair is already registered.
    #[error("attribute converter from {from} to {to} is already registered")]
    DuplicateConverter {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
    },

    /// The codec declares the format but does not implement the operation.
    #[error("{codec} does not implement {operation}")]
    NotImplemented {
        /// Codec display name.
        codec: &'static str,
        /// `"read"` or `"write"`.
        operation: &'static str,
    },

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(details: impl Into<String>) -> Self {
        MeshError::SchemaMismatch {
            details: details.into(),
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MeshError::LoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MeshError::SaveError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn incompatible(
        format: &'static str,
        slot: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MeshError::IncompatibleSchema {
            format,
            slot: slot.into(),
            reason: reason.into(),
        }
    }
}
