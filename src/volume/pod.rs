//! Pod identifier - which workload owns a volume

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumeError};

/// Identifies the pod a volume was created for.
///
/// Stored as `data.json` in the volume root: `{"namespace": .., "name": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodIdentifier {
    pub namespace: String,
    pub name: String,
}

impl PodIdentifier {
    /// Build and validate a pod identifier
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let id = Self {
            namespace: namespace.into(),
            name: name.into(),
        };
        id.validate()?;
        Ok(id)
    }

    /// Both fields must be non-empty
    pub fn validate(&self) -> Result<()> {
        let mut fields = Vec::new();
        if self.namespace.is_empty() {
            fields.push("namespace");
        }
        if self.name.is_empty() {
            fields.push("name");
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(VolumeError::Validation {
                what: "volume pod identifier",
                fields,
            })
        }
    }
}

impl fmt::Display for PodIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
