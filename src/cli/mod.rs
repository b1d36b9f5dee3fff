pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;
use crate::error::Result;
use crate::volume::Request;

/// Exit status for command line usage errors
pub const USAGE_EXIT: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "sshmount")]
#[command(version)]
#[command(about = "Mount remote directories over SSHFS by name")]
#[command(long_about = "Mount and unmount remote directories as local mount points using SSHFS.\n\n\
Volumes are read from a flat table, one per line:\n\n  \
vol0 janedoe@host:/home/janedoe\n  \
alias v0 vol0\n\n\
Examples:\n  \
sshmount janedoe@host:/home/janedoe vol0\n  \
sshmount --mount vol0\n  \
sshmount --mount --all\n  \
sshmount --umount vol0\n  \
sshmount --umount --all")]
pub struct Cli {
    /// REMOTE_URI MOUNTPOINT_NAME, or a single volume name
    #[arg(value_name = "ARGS", num_args = 0..=2)]
    pub args: Vec<String>,

    /// Mount a volume from the volume table (with --all: every volume)
    #[arg(short, long, value_name = "VOLUME", num_args = 0..=1, conflicts_with_all = ["umount", "list", "volumes"])]
    pub mount: Option<Option<String>>,

    /// Unmount a mount point (with --all: every sshfs mount)
    #[arg(short, long, visible_alias = "unmount", value_name = "MOUNTPOINT", num_args = 0..=1, conflicts_with_all = ["list", "volumes"])]
    pub umount: Option<Option<String>>,

    /// Apply --mount or --umount to all volumes
    #[arg(short, long)]
    pub all: bool,

    /// List mounted sshfs volumes
    #[arg(short, long, conflicts_with_all = ["all", "volumes"])]
    pub list: bool,

    /// Show the volume table and the state of each mount point
    #[arg(long, conflicts_with = "all")]
    pub volumes: bool,

    /// Configuration file (default: ~/.config/sshmount/config.yaml)
    #[arg(short, long, env = "SSHMOUNT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// What a single run of the tool does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Batch(Request),
    ListMounted,
    ShowTable,
}

impl Cli {
    /// Turn parsed flags into a single invocation, or a usage message.
    pub fn invocation(&self) -> std::result::Result<Invocation, String> {
        if self.list {
            return self.no_args("--list").map(|_| Invocation::ListMounted);
        }
        if self.volumes {
            return self.no_args("--volumes").map(|_| Invocation::ShowTable);
        }

        if let Some(flag_name) = &self.umount {
            let name = self.single_name("--umount", flag_name.as_deref())?;
            return Ok(Invocation::Batch(match name {
                None => Request::UnmountAll,
                Some(name) => Request::UnmountByName { name },
            }));
        }

        if let Some(flag_name) = &self.mount {
            let name = self.single_name("--mount", flag_name.as_deref())?;
            return Ok(Invocation::Batch(match name {
                None => Request::MountAll,
                Some(name) => Request::MountByName { name },
            }));
        }

        match (self.all, self.args.as_slice()) {
            (true, []) => Ok(Invocation::Batch(Request::MountAll)),
            (true, _) => Err("--all cannot be combined with volume names".to_string()),
            (false, [name]) => Ok(Invocation::Batch(Request::MountByName { name: name.clone() })),
            (false, [remote, name]) => Ok(Invocation::Batch(Request::MountExplicit {
                remote: remote.clone(),
                name: name.clone(),
            })),
            (false, _) => Err(
                "nothing to do: give REMOTE_URI MOUNTPOINT_NAME, a volume name, or --all"
                    .to_string(),
            ),
        }
    }

    fn no_args(&self, flag: &str) -> std::result::Result<(), String> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(format!("{} takes no arguments", flag))
        }
    }

    /// Name given either as the flag value or as the only positional.
    /// `None` means "all" and requires `--all`.
    fn single_name(
        &self,
        flag: &str,
        flag_value: Option<&str>,
    ) -> std::result::Result<Option<String>, String> {
        let name = match (flag_value, self.args.as_slice()) {
            (Some(name), []) => Some(name.to_string()),
            (None, [name]) => Some(name.clone()),
            (None, []) => None,
            _ => return Err(format!("{} takes a single name", flag)),
        };

        match (name, self.all) {
            (Some(_), true) => Err(format!("{} accepts either a name or --all", flag)),
            (None, false) => Err(format!("{} needs a name or --all", flag)),
            (name, _) => Ok(name),
        }
    }

    /// Run the invocation and return the process exit status.
    pub async fn execute(self) -> Result<i32> {
        let invocation = match self.invocation() {
            Ok(invocation) => invocation,
            Err(message) => {
                eprintln!("error: {}\n\nFor more information, try '--help'.", message);
                return Ok(USAGE_EXIT);
            }
        };

        let config = AppConfig::load(self.config.as_deref())?;
        tracing::debug!("Using mount base {}", config.mount_base_path().display());

        match invocation {
            Invocation::Batch(request) => commands::run_batch(&config, &request).await,
            Invocation::ListMounted => commands::list_mounted(&config).await,
            Invocation::ShowTable => commands::show_table(&config).await,
        }
    }
}
