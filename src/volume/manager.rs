//! Mount point lifecycle
//!
//! Owns the mapping from a requested name to a directory under the mount
//! base, creates that directory before mounting and removes it again (when
//! empty) after unmounting. Mount state is never stored; it is inferred from
//! the directory and the OS mount table whenever it is asked for.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MountError, Result};

use super::name::sanitize;
use super::transport::{MountEntry, MountTransport};

/// Local directory a volume is mounted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    /// Sanitized name, the last path component
    pub name: String,

    /// `base/name`
    pub path: PathBuf,
}

impl MountPoint {
    pub fn new(base: &Path, requested: &str) -> Result<Self> {
        let name = sanitize(requested)?;
        let path = base.join(&name);
        Ok(Self { name, path })
    }

    /// Infer the current state from the directory and a mount table listing.
    pub fn state(&self, mounts: &[MountEntry]) -> MountState {
        if mounts.iter().any(|m| m.mount_point == self.path) {
            MountState::Mounted
        } else if self.path.is_dir() {
            MountState::Unmounted
        } else {
            MountState::Absent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Absent,
    Unmounted,
    Mounted,
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountState::Absent => write!(f, "absent"),
            MountState::Unmounted => write!(f, "not mounted"),
            MountState::Mounted => write!(f, "mounted"),
        }
    }
}

/// Whether the effective user may read, write and traverse `path`.
#[cfg(all(unix, not(target_os = "android")))]
fn has_full_access(path: &Path) -> bool {
    use nix::fcntl::AtFlags;
    use nix::unistd::{faccessat, AccessFlags};

    faccessat(
        None,
        path,
        AccessFlags::R_OK | AccessFlags::W_OK | AccessFlags::X_OK,
        AtFlags::AT_EACCESS,
    )
    .is_ok()
}

#[cfg(target_os = "android")]
fn has_full_access(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::R_OK | AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn has_full_access(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

/// Mounts and unmounts single volumes under a fixed base directory.
pub struct MountPointManager<T> {
    base: PathBuf,
    transport: T,
    access_check: fn(&Path) -> bool,
}

impl<T: MountTransport> MountPointManager<T> {
    pub fn new(base: impl Into<PathBuf>, transport: T) -> Self {
        Self {
            base: base.into(),
            transport,
            access_check: has_full_access,
        }
    }

    /// Replace the check run against an existing mount point directory.
    #[cfg(test)]
    pub fn with_access_check(mut self, check: fn(&Path) -> bool) -> Self {
        self.access_check = check;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn mount_point(&self, requested: &str) -> Result<MountPoint> {
        MountPoint::new(&self.base, requested)
    }

    /// Mount `remote` on the mount point for `requested`.
    ///
    /// A directory created here is left in place when the transport fails.
    pub async fn mount_one(&self, remote: &str, requested: &str) -> Result<MountPoint> {
        let mount_point = self.mount_point(requested)?;
        let path = &mount_point.path;

        if !path.exists() {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|source| MountError::Directory {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!("Created mount point {}", path.display());
        } else if !(self.access_check)(path) {
            return Err(MountError::Permission { path: path.clone() });
        }

        self.transport.mount(remote, path).await?;

        Ok(mount_point)
    }

    /// Unmount the mount point for `requested` and remove its directory.
    ///
    /// Failing to remove the directory afterwards (e.g. it is not empty) is
    /// only logged: the unmount itself succeeded.
    pub async fn unmount_one(&self, requested: &str) -> Result<MountPoint> {
        let mount_point = self.mount_point(requested)?;
        let path = &mount_point.path;

        if !path.exists() {
            return Err(MountError::NotFound(format!(
                "Mount point {} does not exist",
                path.display()
            )));
        }

        self.transport.unmount(path).await?;

        if let Err(e) = tokio::fs::remove_dir(path).await {
            tracing::warn!("Could not remove mount point {}: {}", path.display(), e);
        }

        Ok(mount_point)
    }

    /// Unmount every mount of the transport's filesystem types at once.
    ///
    /// No mount point directories are touched.
    pub async fn unmount_all(&self) -> Result<()> {
        self.transport.unmount_all().await
    }
}
