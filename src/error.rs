//! Error types for identity volume operations

use std::io;

/// Result alias used throughout the volume layer
pub type Result<T> = std::result::Result<T, VolumeError>;

/// Errors raised while creating, reading or writing an identity volume
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// A required field was empty, or a handle was not a safe path segment
    #[error("invalid {what}: bad fields [{}]", .fields.join(", "))]
    Validation {
        what: &'static str,
        fields: Vec<&'static str>,
    },

    /// A filesystem call failed; `op` names what we were doing
    #[error("{op}: {source}")]
    Io {
        op: String,
        #[source]
        source: io::Error,
    },

    /// JSON marshal failed
    #[error("JSON marshal: {0}")]
    Encode(#[source] serde_json::Error),

    /// A file existed but did not hold the JSON we expected
    #[error("JSON unmarshal of {what} file: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// No identity context has been saved for this volume yet
    #[error("no context found")]
    NoContext,
}

impl VolumeError {
    pub(crate) fn io(op: impl Into<String>, source: io::Error) -> Self {
        VolumeError::Io {
            op: op.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file or directory
    pub fn is_not_found(&self) -> bool {
        matches!(self, VolumeError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
