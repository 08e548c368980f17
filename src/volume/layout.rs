//! On-disk layout of an identity volume
//!
//! ```text
//! <host-root>/
//! └── <handle>/                ← root directory (host only)
//!     ├── data.json            ← pod identifier
//!     ├── context.json         ← identity context written by the agent
//!     └── mount/               ← bind-mounted into the container
//!         ├── connect/         ← bind mount of the agent socket directory
//!         └── id               ← the handle, as plain text
//! ```
//!
//! Host-only files sit next to `mount/`, never under it, so nothing the
//! orchestrator mounts into the workload can reach them.

use std::path::{Path, PathBuf};

use super::handle::VolumeHandle;

pub const MOUNT_DIR: &str = "mount";
pub const CONNECT_DIR: &str = "connect";
pub const DATA_FILE: &str = "data.json";
pub const CONTEXT_FILE: &str = "context.json";
pub const ID_FILE: &str = "id";

/// Mode for every directory we create (rwxr-x---)
pub const DIR_MODE: u32 = 0o750;

/// Mode for every file we write (rw-r-----)
pub const FILE_MODE: u32 = 0o640;

/// All paths derived from a host root and a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLayout {
    root: PathBuf,
}

impl VolumeLayout {
    pub fn new(host_root: &Path, handle: &VolumeHandle) -> Self {
        Self {
            root: host_root.join(handle.as_str()),
        }
    }

    /// `<host-root>/<handle>`
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// The directory that should be mounted into a container
    pub fn mount_root(&self) -> PathBuf {
        self.root.join(MOUNT_DIR)
    }

    /// Directory the agent socket is bind-mounted onto
    pub fn socket_dir(&self) -> PathBuf {
        self.mount_root().join(CONNECT_DIR)
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    pub fn context_file(&self) -> PathBuf {
        self.root.join(CONTEXT_FILE)
    }

    pub fn id_file(&self) -> PathBuf {
        self.mount_root().join(ID_FILE)
    }
}
