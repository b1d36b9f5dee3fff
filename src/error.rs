use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("Invalid name '{0}': must contain at least one letter or digit")]
    InvalidName(String),

    #[error("Volume table {} is not usable: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Volume '{name}' is defined {count} times in the volume table")]
    AmbiguousName { name: String, count: usize },

    /// A row matched the requested name but does not have exactly two fields.
    #[error("Malformed volume table entry for '{name}' on line {line}: expected 2 fields, found {fields}")]
    MalformedRecord {
        name: String,
        line: usize,
        fields: usize,
    },

    #[error("Failed to create mount point {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Insufficient permissions on mount point {}: read, write and execute are required", path.display())]
    Permission { path: PathBuf },

    #[error("Failed to mount {remote} at {}: {message}", path.display())]
    MountTransport {
        remote: String,
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("Failed to unmount {}: {message}", path.display())]
    UnmountTransport {
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("Failed to unmount all {types} mounts: {message}")]
    UnmountAllTransport {
        types: String,
        code: Option<i32>,
        message: String,
    },

    #[error("Mount helper '{0}' was not found in PATH")]
    TransportUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MountError {
    /// Process exit status this error should contribute.
    ///
    /// Transport failures propagate the helper's own status; a helper killed
    /// by a signal has no code and counts as 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MountTransport { code, .. }
            | Self::UnmountTransport { code, .. }
            | Self::UnmountAllTransport { code, .. } => {
                code.filter(|c| *c > 0).unwrap_or(1)
            }
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, MountError>;
