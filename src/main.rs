//! idvol - inspect and manage identity volumes on a host
//!
//! The volume driver and host agent use the library directly; this binary
//! drives the same layout by hand for operators and local debugging.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};

use identity_volume::logging::{init_logging, LogFormat};
use identity_volume::volume::layout::CONNECT_DIR;
use identity_volume::{
    read_volume_id, IdentityVolume, VolumeConfig, VolumeError, VolumeHandle, VolumeManager,
};

#[derive(Parser, Debug)]
#[command(name = "idvol", version, about = "Manage host-side identity volumes")]
struct Cli {
    /// Directory holding one subdirectory per volume
    #[arg(
        long,
        env = "IDVOL_HOST_ROOT",
        default_value = identity_volume::config::DEFAULT_HOST_ROOT
    )]
    root: PathBuf,

    /// Log output format (plain or json)
    #[arg(long, default_value = "plain")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the handle derived from a mount path
    Handle { mount_path: String },

    /// Create the volume for a mount path
    Create {
        mount_path: String,
        #[arg(long)]
        namespace: String,
        #[arg(long)]
        name: String,
    },

    /// Remove a volume and everything in it
    Destroy(Target),

    /// Print a volume's layout and owning pod
    Show(Target),

    /// List every volume under the host root
    List,

    /// Print the identity context saved for a volume
    Context(Target),

    /// From inside a workload: read the id file of a mounted volume
    Whoami { mount_dir: PathBuf },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Target {
    /// Mount path the volume was created for
    mount_path: Option<String>,

    /// Handle of an existing volume
    #[arg(long)]
    handle: Option<String>,
}

impl Target {
    fn resolve(&self, manager: &VolumeManager) -> anyhow::Result<IdentityVolume> {
        match (&self.mount_path, &self.handle) {
            (Some(path), _) => Ok(manager.volume(path)),
            (None, Some(handle)) => {
                let handle: VolumeHandle = handle.parse().context("bad --handle")?;
                Ok(manager.volume_from_handle(handle))
            }
            (None, None) => Err(anyhow!("either a mount path or --handle is required")),
        }
    }
}

/// Create a volume, removing the tree again if this call was the one that
/// started it and it failed part way. A volume that already existed is
/// never rolled back, and a rejected pod identifier never touched disk.
fn create_volume(volume: &IdentityVolume, namespace: &str, name: &str) -> anyhow::Result<()> {
    let existed = volume.exists();
    match volume.create(namespace, name) {
        Ok(()) => Ok(()),
        Err(e @ VolumeError::Validation { .. }) => Err(e).context("create volume"),
        Err(e) => {
            if !existed {
                if let Err(cleanup) = volume.destroy() {
                    tracing::warn!(
                        handle = %volume.handle(),
                        error = %cleanup,
                        "cleanup after failed create"
                    );
                }
            }
            Err(e).context("create volume")
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format).map_err(|e| anyhow!(e))?;

    let manager = VolumeManager::new(VolumeConfig::new(&cli.root));

    match cli.command {
        Command::Handle { mount_path } => {
            println!("{}", VolumeHandle::from_mount_path(&mount_path));
        }

        Command::Create {
            mount_path,
            namespace,
            name,
        } => {
            let volume = manager.volume(&mount_path);
            create_volume(&volume, &namespace, &name)?;
            println!("{}", volume.mount_root().display());
        }

        Command::Destroy(target) => {
            let volume = target.resolve(&manager)?;
            volume.destroy().context("destroy volume")?;
        }

        Command::Show(target) => {
            let volume = target.resolve(&manager)?;
            let layout = volume.layout();
            println!("handle:     {}", volume.handle());
            println!("root:       {}", layout.root_dir().display());
            println!("mount root: {}", layout.mount_root().display());
            println!("socket dir: {}", layout.socket_dir().display());
            match volume.pod_identifier() {
                Ok(pod) => println!("pod:        {pod}"),
                Err(e) if e.is_not_found() => println!("pod:        (volume not created)"),
                Err(e) => return Err(e).context("read pod identifier"),
            }
            println!("context:    {}", if volume.has_context() { "saved" } else { "none" });
        }

        Command::List => {
            for handle in manager.list().context("list volumes")? {
                let volume = manager.volume_from_handle(handle);
                match volume.pod_identifier() {
                    Ok(pod) => println!("{}\t{}", volume.handle(), pod),
                    Err(e) => println!("{}\t<{}>", volume.handle(), e),
                }
            }
        }

        Command::Context(target) => {
            let volume = target.resolve(&manager)?;
            match volume.load_context::<serde_json::Value>() {
                Ok(ctx) => println!("{}", serde_json::to_string_pretty(&ctx)?),
                Err(VolumeError::NoContext) => {
                    eprintln!("no context saved for {}", volume.handle())
                }
                Err(e) => return Err(e).context("load context"),
            }
        }

        Command::Whoami { mount_dir } => {
            let handle = read_volume_id(&mount_dir).context("read volume id")?;
            println!("id:         {handle}");
            println!("socket dir: {}", mount_dir.join(CONNECT_DIR).display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_volume_bad_pod_keeps_live_volume() {
        let tmp = TempDir::new().unwrap();
        let manager = VolumeManager::new(VolumeConfig::new(tmp.path()));
        let volume = manager.volume("/mnt/live");
        create_volume(&volume, "prod", "api").unwrap();

        assert!(create_volume(&volume, "", "api").is_err());

        assert!(volume.exists());
        assert_eq!(volume.pod_identifier().unwrap().to_string(), "prod/api");
        assert_eq!(manager.list().unwrap(), vec![volume.handle().clone()]);
    }

    #[test]
    fn test_create_volume_failed_recreate_keeps_live_volume() {
        let tmp = TempDir::new().unwrap();
        let manager = VolumeManager::new(VolumeConfig::new(tmp.path()));
        let volume = manager.volume("/mnt/live");
        create_volume(&volume, "prod", "api").unwrap();
        volume.save_context(&serde_json::json!({"token": "t"})).unwrap();

        // a directory where the id file belongs makes the re-create fail
        let id_file = volume.layout().id_file();
        std::fs::remove_file(&id_file).unwrap();
        std::fs::create_dir(&id_file).unwrap();

        assert!(create_volume(&volume, "prod", "api").is_err());
        assert!(volume.exists());
        assert!(volume.has_context());
    }

    #[test]
    fn test_create_volume_fresh_failure_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        // a host root that is a regular file makes mkdir fail
        let blocked = tmp.path().join("not-a-dir");
        std::fs::write(&blocked, "x").unwrap();
        let volume = VolumeManager::new(VolumeConfig::new(&blocked)).volume("/mnt/new");

        let err = create_volume(&volume, "ns", "pod").unwrap_err();
        assert!(err.to_string().contains("create volume"));
        assert!(!volume.exists());
        assert_eq!(std::fs::read_to_string(&blocked).unwrap(), "x");
    }
}
