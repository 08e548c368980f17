//! Identity volume module
//!
//! This module provides the on-disk hand-off between the volume driver, the
//! host agent and the workload:
//! - Volume handles (hash of the mount path)
//! - Layout (which file lives where, and who can see it)
//! - Pod identifier and identity context persistence
//! - Volume lifecycle (create, destroy)

pub mod handle;
pub mod identity;
pub mod layout;
pub mod manager;
mod persist;
pub mod pod;

pub use handle::{read_volume_id, VolumeHandle};
pub use identity::IdentityVolume;
pub use layout::VolumeLayout;
pub use manager::VolumeManager;
pub use pod::PodIdentifier;
