//! Identity Volume - one workload's slice of the host volume root
//!
//! The client in the container where this volume is mounted connects to the
//! agent socket in `connect/` and presents the opaque id from the `id` file.
//! Everything the agent needs to remember about the workload stays in the
//! root directory, outside of what gets mounted.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::handle::VolumeHandle;
use super::layout::VolumeLayout;
use super::persist;
use super::pod::PodIdentifier;
use crate::error::{Result, VolumeError};

/// An identity volume under a host root.
///
/// Holds no file content itself, only the handle and the paths derived
/// from it; construct one per operation.
///
/// # Example
///
/// ```ignore
/// let volume = IdentityVolume::new("/var/athenz/volumes", mount_path);
///
/// // Volume driver, on mount
/// volume.create("default", "web-0")?;
/// bind_mount(volume.mount_root(), mount_path)?;
///
/// // Host agent, later
/// let pod = volume.pod_identifier()?;
/// volume.save_context(&ctx)?;
///
/// // Volume driver, on unmount
/// volume.destroy()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityVolume {
    handle: VolumeHandle,
    layout: VolumeLayout,
}

impl IdentityVolume {
    /// Volume for a mount path; the handle is the hash of the path
    pub fn new(host_root: impl AsRef<Path>, mount_path: &str) -> Self {
        Self::from_handle(host_root, VolumeHandle::from_mount_path(mount_path))
    }

    /// Volume for a handle that was already computed
    pub fn from_handle(host_root: impl AsRef<Path>, handle: VolumeHandle) -> Self {
        let layout = VolumeLayout::new(host_root.as_ref(), &handle);
        Self { handle, layout }
    }

    pub fn handle(&self) -> &VolumeHandle {
        &self.handle
    }

    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    /// The path that should be mounted into a container
    pub fn mount_root(&self) -> PathBuf {
        self.layout.mount_root()
    }

    /// The directory holding the agent socket, as seen from the host
    pub fn socket_dir(&self) -> PathBuf {
        self.layout.socket_dir()
    }

    /// Whether the root directory is present on disk
    pub fn exists(&self) -> bool {
        self.layout.root_dir().is_dir()
    }

    /// Create the on-disk tree for the supplied pod.
    ///
    /// # What This Does
    ///
    /// 1. Validates the pod identifier (nothing is touched if it is invalid)
    /// 2. Creates `<root>/mount/connect`, mode 0750, idempotently
    /// 3. Writes `data.json` with the pod identifier
    /// 4. Writes `mount/id` with the handle
    ///
    /// A failure after step 2 leaves whatever was created in place; call
    /// [`destroy`](Self::destroy) to clean up.
    pub fn create(&self, namespace: &str, name: &str) -> Result<()> {
        let pod = PodIdentifier::new(namespace, name)?;

        persist::create_dirs(self.layout.root_dir(), &self.layout.socket_dir())?;
        persist::write_json("data", &self.layout.data_file(), &pod)?;
        persist::write_file("id", &self.layout.id_file(), self.handle.as_str().as_bytes())?;

        tracing::info!(handle = %self.handle, pod = %pod, "identity volume created");
        Ok(())
    }

    /// Delete the volume root and everything under it.
    /// A volume that does not exist is already destroyed.
    pub fn destroy(&self) -> Result<()> {
        persist::remove_dir_all(self.layout.root_dir())?;
        tracing::info!(handle = %self.handle, "identity volume destroyed");
        Ok(())
    }

    /// The pod this volume was created for.
    ///
    /// A volume that was never created (or was destroyed) fails with an
    /// `Io` error for which [`VolumeError::is_not_found`] is true.
    pub fn pod_identifier(&self) -> Result<PodIdentifier> {
        let pod: PodIdentifier = persist::read_json("data", &self.layout.data_file())?;
        pod.validate()?;
        Ok(pod)
    }

    /// Save agent state for this volume where the pod cannot see it.
    /// Overwrites any previously saved context.
    pub fn save_context<T>(&self, context: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        persist::write_json("context", &self.layout.context_file(), context)
    }

    /// Load the context saved by [`save_context`](Self::save_context).
    ///
    /// Returns [`VolumeError::NoContext`] if nothing was ever saved, so a
    /// volume that is simply not provisioned yet can be told apart from one
    /// whose context is unreadable.
    pub fn load_context<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        persist::read_json("context", &self.layout.context_file()).map_err(|e| {
            if e.is_not_found() {
                VolumeError::NoContext
            } else {
                e
            }
        })
    }

    /// Whether a context has been saved
    pub fn has_context(&self) -> bool {
        self.layout.context_file().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct AgentContext {
        service: String,
        refreshed: u32,
    }

    fn volume(tmp: &TempDir) -> IdentityVolume {
        IdentityVolume::new(tmp.path(), "/var/lib/kubelet/pods/1234/volumes/identity")
    }

    #[test]
    fn test_create_then_pod_identifier() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);

        v.create("default", "web-0").unwrap();

        assert!(v.exists());
        assert!(v.socket_dir().is_dir());
        assert_eq!(
            v.pod_identifier().unwrap(),
            PodIdentifier::new("default", "web-0").unwrap()
        );
    }

    #[test]
    fn test_create_invalid_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);

        assert!(matches!(v.create("", "x"), Err(VolumeError::Validation { .. })));
        assert!(matches!(v.create("x", ""), Err(VolumeError::Validation { .. })));
        assert!(!v.exists());
    }

    #[test]
    fn test_create_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);

        v.create("ns", "a").unwrap();
        v.create("ns", "a").unwrap();
        assert_eq!(v.pod_identifier().unwrap().to_string(), "ns/a");
    }

    #[test]
    fn test_load_context_before_save() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);
        v.create("ns", "a").unwrap();

        assert!(!v.has_context());
        let err = v.load_context::<AgentContext>().unwrap_err();
        assert!(matches!(err, VolumeError::NoContext));
    }

    #[test]
    fn test_context_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);
        v.create("ns", "a").unwrap();

        let first = AgentContext {
            service: "web".into(),
            refreshed: 1,
        };
        let second = AgentContext {
            service: "web".into(),
            refreshed: 2,
        };
        v.save_context(&first).unwrap();
        v.save_context(&second).unwrap();

        assert!(v.has_context());
        assert_eq!(v.load_context::<AgentContext>().unwrap(), second);
    }

    #[test]
    fn test_corrupt_context_is_not_no_context() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);
        v.create("ns", "a").unwrap();
        std::fs::write(v.layout().context_file(), b"][").unwrap();

        let err = v.load_context::<AgentContext>().unwrap_err();
        assert!(matches!(err, VolumeError::Decode { what: "context", .. }));
    }

    #[test]
    fn test_tampered_metadata_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);
        v.create("ns", "a").unwrap();
        std::fs::write(v.layout().data_file(), br#"{"namespace":"","name":"a"}"#).unwrap();

        assert!(matches!(v.pod_identifier(), Err(VolumeError::Validation { .. })));
    }

    #[test]
    fn test_destroy() {
        let tmp = TempDir::new().unwrap();
        let v = volume(&tmp);
        v.create("ns", "a").unwrap();

        v.destroy().unwrap();
        assert!(!v.exists());
        assert!(v.pod_identifier().unwrap_err().is_not_found());
        v.destroy().unwrap();
    }
}
