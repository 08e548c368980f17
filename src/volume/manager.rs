//! Volume Manager - hands out identity volumes under one host root
//!
//! Both the volume driver and the host agent build one of these from the
//! same `VolumeConfig`, so they agree on where every volume lives.

use std::fs;
use std::io;
use std::path::Path;

use super::handle::VolumeHandle;
use super::identity::IdentityVolume;
use crate::config::VolumeConfig;
use crate::error::{Result, VolumeError};

/// Factory for identity volumes rooted at the configured host root
#[derive(Debug, Clone)]
pub struct VolumeManager {
    config: VolumeConfig,
}

impl VolumeManager {
    pub fn new(config: VolumeConfig) -> Self {
        Self { config }
    }

    pub fn host_root(&self) -> &Path {
        self.config.host_root()
    }

    /// The volume backing `mount_path`
    pub fn volume(&self, mount_path: &str) -> IdentityVolume {
        IdentityVolume::new(self.host_root(), mount_path)
    }

    /// The volume for a handle the caller already has
    pub fn volume_from_handle(&self, handle: VolumeHandle) -> IdentityVolume {
        IdentityVolume::from_handle(self.host_root(), handle)
    }

    /// List the handles of all volumes under the host root.
    ///
    /// Entries that are not directories, or whose names are not valid
    /// handles, are skipped. A host root that does not exist yet has no
    /// volumes.
    pub fn list(&self) -> Result<Vec<VolumeHandle>> {
        let op = |e: io::Error| VolumeError::io("list volumes", e);

        let entries = match fs::read_dir(self.host_root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(op(e)),
        };

        let mut handles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(op)?;
            if !entry.file_type().map_err(op)?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            match VolumeHandle::from_hashed(&name) {
                Ok(handle) => handles.push(handle),
                Err(_) => tracing::debug!(entry = %name, "skipping non-volume entry"),
            }
        }

        handles.sort();
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let manager = VolumeManager::new(VolumeConfig::new(tmp.path().join("absent")));
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_foreign_entries() {
        let tmp = TempDir::new().unwrap();
        let manager = VolumeManager::new(VolumeConfig::new(tmp.path()));

        let volume = manager.volume("/mnt/pod-a");
        volume.create("ns", "a").unwrap();
        fs::write(tmp.path().join("stray-file"), "x").unwrap();
        fs::create_dir(tmp.path().join("has.dot")).unwrap();

        assert_eq!(manager.list().unwrap(), vec![volume.handle().clone()]);
    }

    #[test]
    fn test_volume_and_volume_from_handle_agree() {
        let manager = VolumeManager::new(VolumeConfig::new("/var/athenz/volumes"));
        let by_path = manager.volume("/mnt/pod-a");
        let by_handle = manager.volume_from_handle(by_path.handle().clone());
        assert_eq!(by_path, by_handle);
    }
}
