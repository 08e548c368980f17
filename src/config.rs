//! Host-side configuration for identity volumes

use std::path::{Path, PathBuf};

/// Default directory under which per-volume roots are created
pub const DEFAULT_HOST_ROOT: &str = "/var/athenz/volumes";

/// Configuration for the VolumeManager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConfig {
    /// Root directory under which every volume gets `<host_root>/<handle>`
    pub host_root: PathBuf,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            host_root: PathBuf::from(DEFAULT_HOST_ROOT),
        }
    }
}

impl VolumeConfig {
    /// Create a config rooted at `host_root`
    pub fn new(host_root: impl Into<PathBuf>) -> Self {
        Self {
            host_root: host_root.into(),
        }
    }

    /// Replace the host root
    pub fn with_host_root(mut self, host_root: impl Into<PathBuf>) -> Self {
        self.host_root = host_root.into();
        self
    }

    pub fn host_root(&self) -> &Path {
        &self.host_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_root() {
        let config = VolumeConfig::default();
        assert_eq!(config.host_root(), Path::new("/var/athenz/volumes"));
    }

    #[test]
    fn test_with_host_root() {
        let config = VolumeConfig::default().with_host_root("/tmp/volumes");
        assert_eq!(config, VolumeConfig::new("/tmp/volumes"));
    }
}
