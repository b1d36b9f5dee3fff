//! Volume registry and mount orchestration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BatchOrchestrator                        │
//! │   Request ──► resolve names ──► mount/unmount per item      │
//! │         │                              │                     │
//! │         ▼                              ▼                     │
//! │  ┌──────────────┐            ┌───────────────────┐          │
//! │  │VolumeRegistry│            │ MountPointManager │          │
//! │  │ (flat table) │            │  name ─► base/dir │          │
//! │  └──────────────┘            └─────────┬─────────┘          │
//! │                                        ▼                     │
//! │                          ┌──────────────────────────┐        │
//! │                          │   trait MountTransport   │        │
//! │                          │  + mount(remote, path)   │        │
//! │                          │  + unmount(path)         │        │
//! │                          │  + unmount_all()         │        │
//! │                          └────────────┬─────────────┘        │
//! │                                       ▼                      │
//! │                               SshfsTransport                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Volume table
//!
//! One row per line in `~/.config/sshmount/volumes`. There is no comment
//! syntax; every non-blank line is a row.
//!
//! ```text
//! vol0 janedoe@host:/home/janedoe
//! alias v0 vol0
//! ```

pub mod batch;
pub mod manager;
pub mod name;
pub mod table;
pub mod transport;

pub use batch::{Action, BatchOrchestrator, BatchOutcome, Completed, ItemOutcome, Request};
pub use manager::{MountPoint, MountPointManager, MountState};
pub use table::{Row, VolumeRegistry};
pub use transport::{get_install_instructions, MountTransport, SshfsTransport, TransportSettings};

use crate::config::AppConfig;

/// Build the SSHFS-backed transport described by `config`.
pub fn sshfs_transport(config: &AppConfig) -> SshfsTransport {
    SshfsTransport::new(TransportSettings::from_config(config))
}

/// Wire a mount point manager and the volume table together from `config`.
pub fn orchestrator(config: &AppConfig) -> BatchOrchestrator<SshfsTransport> {
    BatchOrchestrator::new(
        MountPointManager::new(config.mount_base_path(), sshfs_transport(config)),
        VolumeRegistry::new(config.volume_table_path()),
    )
}
