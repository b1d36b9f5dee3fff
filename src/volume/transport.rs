//! Mount transport
//!
//! The external helper that actually attaches a remote location to a local
//! directory. [`SshfsTransport`] drives the `sshfs` binary and the system
//! `umount`/`mount` commands; everything above this module only sees the
//! [`MountTransport`] trait.
//!
//! # Requirements
//! - macOS: macFUSE + SSHFS (brew install macfuse sshfs)
//! - Linux: fuse + sshfs (apt install sshfs)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex_lite::Regex;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::error::{MountError, Result};

/// Options passed on every mount: let other local users in, enforce local
/// permission checks, follow symlinks on the remote, disable hard links.
pub const MOUNT_OPTIONS: &[&str] = &[
    "allow_other",
    "default_permissions",
    "follow_symlinks",
    "disable_hardlink",
];

/// A line of the OS mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub remote: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

/// Capability used to mount and unmount remote locations.
#[async_trait]
pub trait MountTransport: Send + Sync {
    /// Returns the transport name (e.g., "sshfs")
    fn name(&self) -> &str;

    /// Check that the helper binary can be found.
    fn is_available(&self) -> bool;

    /// Attach `remote` at `mount_point` with [`MOUNT_OPTIONS`].
    async fn mount(&self, remote: &str, mount_point: &Path) -> Result<()>;

    /// Force-detach whatever is mounted at `mount_point`.
    async fn unmount(&self, mount_point: &Path) -> Result<()>;

    /// Detach every mount of the transport's filesystem types in one call.
    async fn unmount_all(&self) -> Result<()>;

    /// Current mounts of the transport's filesystem types.
    async fn list_mounts(&self) -> Result<Vec<MountEntry>>;
}

/// Commands and filesystem types used by [`SshfsTransport`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub sshfs_command: String,
    pub umount_command: String,
    pub mount_command: String,
    pub fs_types: Vec<String>,
    pub extra_options: Vec<String>,
}

impl TransportSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sshfs_command: config.sshfs_command.clone(),
            umount_command: config.umount_command.clone(),
            mount_command: "mount".to_string(),
            fs_types: config.fs_types.clone(),
            extra_options: config.extra_options.clone(),
        }
    }
}

/// SSHFS transport backed by external processes.
#[derive(Debug, Clone)]
pub struct SshfsTransport {
    settings: TransportSettings,
}

impl SshfsTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    /// Arguments for one `sshfs` invocation.
    fn mount_args(&self, remote: &str, mount_point: &Path) -> Vec<String> {
        let mut args = Vec::new();

        for opt in MOUNT_OPTIONS {
            args.extend(["-o".to_string(), (*opt).to_string()]);
        }

        for opt in &self.settings.extra_options {
            args.extend(["-o".to_string(), opt.clone()]);
        }

        #[cfg(target_os = "macos")]
        {
            // Disable extended attributes and name the volume for Finder
            args.extend(["-o".to_string(), "noapplexattr".to_string()]);
            if let Some(name) = mount_point.file_name() {
                args.extend([
                    "-o".to_string(),
                    format!("volname={}", name.to_string_lossy()),
                ]);
            }
        }

        args.push(remote.to_string());
        args.push(mount_point.to_string_lossy().to_string());
        args
    }
}

fn helper_message(program: &str, output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if stderr.is_empty() {
        format!("{} exited with {}", program, output.status)
    } else {
        stderr.to_string()
    }
}

#[async_trait]
impl MountTransport for SshfsTransport {
    fn name(&self) -> &str {
        "sshfs"
    }

    fn is_available(&self) -> bool {
        which::which(&self.settings.sshfs_command).is_ok()
    }

    async fn mount(&self, remote: &str, mount_point: &Path) -> Result<()> {
        let args = self.mount_args(remote, mount_point);
        tracing::debug!("Running: {} {:?}", self.settings.sshfs_command, args);

        let transport_error = |code, message| MountError::MountTransport {
            remote: remote.to_string(),
            path: mount_point.to_path_buf(),
            code,
            message,
        };

        let output = Command::new(&self.settings.sshfs_command)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                transport_error(
                    None,
                    format!("failed to execute {}: {}", self.settings.sshfs_command, e),
                )
            })?;

        if !output.status.success() {
            let message = helper_message(&self.settings.sshfs_command, &output);

            // Surface the usual FUSE setup problem with a hint
            if message.contains("fuse: device not found") || message.contains("mount_macfuse") {
                return Err(transport_error(
                    output.status.code(),
                    format!("{}\n\n{}", message, get_install_instructions()),
                ));
            }

            return Err(transport_error(output.status.code(), message));
        }

        tracing::debug!("Mounted {} at {}", remote, mount_point.display());
        Ok(())
    }

    async fn unmount(&self, mount_point: &Path) -> Result<()> {
        let program = &self.settings.umount_command;
        tracing::debug!("Running: {} -f {}", program, mount_point.display());

        let output = Command::new(program)
            .arg("-f")
            .arg(mount_point)
            .output()
            .await
            .map_err(|e| MountError::UnmountTransport {
                path: mount_point.to_path_buf(),
                code: None,
                message: format!("failed to execute {}: {}", program, e),
            })?;

        if !output.status.success() {
            return Err(MountError::UnmountTransport {
                path: mount_point.to_path_buf(),
                code: output.status.code(),
                message: helper_message(program, &output),
            });
        }

        tracing::debug!("Unmounted {}", mount_point.display());
        Ok(())
    }

    async fn unmount_all(&self) -> Result<()> {
        let program = &self.settings.umount_command;
        let types = self.settings.fs_types.join(",");
        tracing::debug!("Running: {} -a -t {}", program, types);

        let output = Command::new(program)
            .args(["-a", "-t", &types])
            .output()
            .await
            .map_err(|e| MountError::UnmountAllTransport {
                types: types.clone(),
                code: None,
                message: format!("failed to execute {}: {}", program, e),
            })?;

        if !output.status.success() {
            return Err(MountError::UnmountAllTransport {
                types,
                code: output.status.code(),
                message: helper_message(program, &output),
            });
        }

        Ok(())
    }

    async fn list_mounts(&self) -> Result<Vec<MountEntry>> {
        let output = Command::new(&self.settings.mount_command)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MountError::Io(std::io::Error::other(helper_message(
                &self.settings.mount_command,
                &output,
            ))));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_mount_table(&stdout, &self.settings.fs_types))
    }
}

fn linux_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<src>.+) on (?P<dst>.+) type (?P<ty>\S+) \(.*\)$")
            .expect("valid mount table regex")
    })
}

fn bsd_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<src>.+) on (?P<dst>.+) \((?P<ty>[^,)]+)(?:,.*)?\)$")
            .expect("valid mount table regex")
    })
}

/// Parse `mount` output, keeping only entries whose type is in `fs_types`.
///
/// Understands both the Linux shape (`SRC on DST type T (opts)`) and the
/// BSD/macOS shape (`SRC on DST (T, opts)`).
pub fn parse_mount_table(output: &str, fs_types: &[String]) -> Vec<MountEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let caps = linux_line()
                .captures(line)
                .or_else(|| bsd_line().captures(line))?;

            Some(MountEntry {
                remote: caps["src"].to_string(),
                mount_point: PathBuf::from(&caps["dst"]),
                fs_type: caps["ty"].trim().to_string(),
            })
        })
        .filter(|entry| fs_types.iter().any(|t| *t == entry.fs_type))
        .collect()
}

/// Get installation instructions for SSHFS
pub fn get_install_instructions() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "SSHFS is not installed.\n\n\
         Install with Homebrew:\n\
         brew install macfuse sshfs\n\n\
         After installation, restart your computer.\n\
         You may need to allow the kernel extension in:\n\
         System Settings > Privacy & Security"
    }

    #[cfg(target_os = "linux")]
    {
        "SSHFS is not installed.\n\n\
         Install with your package manager:\n\
         Ubuntu/Debian: sudo apt install sshfs\n\
         Fedora: sudo dnf install fuse-sshfs\n\
         Arch: sudo pacman -S sshfs"
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        "SSHFS is not available on this platform."
    }
}
