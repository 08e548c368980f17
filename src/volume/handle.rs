//! Volume Handle - the hashed, filesystem-safe name of a volume root
//!
//! The volume driver only ever sees the mount path the orchestrator hands it,
//! so the handle is re-derived from that path on every call instead of being
//! stored anywhere:
//!
//! ```text
//! mount path ──SHA-256──► 32 bytes ──base64 (URL-safe, no pad)──► 43 chars
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use super::layout::ID_FILE;
use crate::error::{Result, VolumeError};

/// Opaque identifier for a volume, used as its directory name on the host
/// and handed to the workload through the id file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeHandle(String);

impl VolumeHandle {
    /// Derive the handle for a mount path
    pub fn from_mount_path(mount_path: &str) -> Self {
        let digest = Sha256::digest(mount_path.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Wrap a handle recovered from an id file or a directory listing.
    ///
    /// No hashing is done, but the value must still be usable as a single
    /// path segment: only the URL-safe base64 alphabet is accepted.
    pub fn from_hashed(handle: &str) -> Result<Self> {
        if !is_handle_segment(handle) {
            return Err(VolumeError::Validation {
                what: "volume handle",
                fields: vec!["handle"],
            });
        }
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_handle_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl fmt::Display for VolumeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VolumeHandle {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hashed(s)
    }
}

impl AsRef<str> for VolumeHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read the handle from inside a mounted volume.
///
/// This is what a workload does to find out which opaque id to present to
/// the host agent: `mount_dir` is wherever the volume's mount root ended up
/// in the container.
pub fn read_volume_id(mount_dir: impl AsRef<Path>) -> Result<VolumeHandle> {
    let path = mount_dir.as_ref().join(ID_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|e| VolumeError::io("read id file", e))?;
    VolumeHandle::from_hashed(raw.trim())
}
