//! Identity Volume - host-local hand-off of workload identity through a volume
//!
//! A volume driver creates one directory tree per workload under a host
//! root. The part mounted into the container exposes a socket directory
//! (where the host agent listens) and an opaque id; the rest holds host-only
//! state the agent reads and writes while it provisions credentials.
//!
//! # Modules
//!
//! - `volume` - handle derivation, layout, lifecycle and persistence
//! - `config` - host root configuration
//! - `error` - error type shared by every operation
//! - `logging` - subscriber setup for the `idvol` binary
//!
//! # Quick Start
//!
//! ```ignore
//! use identity_volume::{VolumeConfig, VolumeManager};
//!
//! let manager = VolumeManager::new(VolumeConfig::default());
//! let volume = manager.volume("/var/lib/kubelet/pods/<uid>/volumes/identity");
//!
//! volume.create("default", "web-0")?;
//! println!("mount {} into the pod", volume.mount_root().display());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod volume;

// Re-export commonly used types at crate root for convenience
pub use config::VolumeConfig;
pub use error::{Result, VolumeError};
pub use volume::{read_volume_id, IdentityVolume, PodIdentifier, VolumeHandle, VolumeManager};
