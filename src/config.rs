use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MountError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory mount points are created under
    pub mount_base: String,
    /// Flat volume table (`name remote` / `alias name target` rows)
    pub volume_table: String,
    pub sshfs_command: String,
    pub umount_command: String,
    /// Filesystem types unmounted by `--umount --all` and shown by `--list`
    pub fs_types: Vec<String>,
    /// Extra `-o` options passed to sshfs after the fixed ones
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_options: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mount_base: "~/mnt".to_string(),
            volume_table: "~/.config/sshmount/volumes".to_string(),
            sshfs_command: "sshfs".to_string(),
            umount_command: "umount".to_string(),
            fs_types: vec![
                "fuse.sshfs".to_string(),
                "osxfuse".to_string(),
                "macfuse".to_string(),
            ],
            extra_options: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config").join("sshmount"))
            .ok_or_else(|| MountError::Config("Could not determine home directory".to_string()))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Load from `path` (or the default location). A missing file yields the
    /// defaults; environment overrides are applied either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_yaml(&content)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(base) = std::env::var("SSHMOUNT_BASE") {
            config.mount_base = base;
        }
        if let Ok(table) = std::env::var("SSHMOUNT_TABLE") {
            config.volume_table = table;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| MountError::Config(format!("Invalid config: {}", e)))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.mount_base.trim().is_empty() {
            return Err(MountError::Config("mount_base must not be empty".to_string()));
        }

        if self.volume_table.trim().is_empty() {
            return Err(MountError::Config(
                "volume_table must not be empty".to_string(),
            ));
        }

        if self.sshfs_command.trim().is_empty() || self.umount_command.trim().is_empty() {
            return Err(MountError::Config(
                "sshfs_command and umount_command must not be empty".to_string(),
            ));
        }

        if self.fs_types.is_empty() {
            return Err(MountError::Config(
                "fs_types must list at least one filesystem type".to_string(),
            ));
        }

        Ok(())
    }

    /// Mount base with `~` expanded, made absolute against the working
    /// directory so it compares equal to mount table entries.
    pub fn mount_base_path(&self) -> PathBuf {
        let base = PathBuf::from(shellexpand::tilde(&self.mount_base).as_ref());
        std::path::absolute(&base).unwrap_or(base)
    }

    /// Volume table path with `~` expanded.
    pub fn volume_table_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.volume_table).as_ref())
    }
}
