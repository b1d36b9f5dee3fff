//! List and table commands
//!
//! Commands for viewing mounted volumes and the configured volume table.

use console::style;

use crate::config::AppConfig;
use crate::error::Result;
use crate::volume::{self, MountPoint, MountState, MountTransport, Row, VolumeRegistry};

/// Helper function - uses char-based truncation to avoid UTF-8 panics
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    } else {
        s.to_string()
    }
}

/// List mounts of the configured filesystem types from the OS mount table
pub async fn list_mounted(config: &AppConfig) -> Result<i32> {
    let transport = volume::sshfs_transport(config);
    let mounts = transport.list_mounts().await?;

    println!();

    if mounts.is_empty() {
        println!("  {}", style("No sshfs volumes mounted").dim());
        println!();
        return Ok(0);
    }

    println!(
        "  {:<40} {}",
        style("Remote").bold(),
        style("Local Mount").bold()
    );
    println!("  {}", style("─".repeat(80)).dim());

    for entry in &mounts {
        println!(
            "  {:<40} {}",
            truncate(&entry.remote, 38),
            style(entry.mount_point.display()).green()
        );
    }

    println!();
    println!(
        "  {} {} currently mounted",
        style("•").green(),
        mounts.len()
    );
    println!();

    Ok(0)
}

/// Show every row of the volume table with the state of its mount point
pub async fn show_table(config: &AppConfig) -> Result<i32> {
    let registry = VolumeRegistry::new(config.volume_table_path());
    let table = registry.load()?;
    let base = config.mount_base_path();

    let mounts = match volume::sshfs_transport(config).list_mounts().await {
        Ok(mounts) => mounts,
        Err(e) => {
            tracing::warn!("Could not read the mount table: {}", e);
            Vec::new()
        }
    };

    println!();
    println!(
        "  {} {}",
        style("Volumes in").dim(),
        style(registry.path().display()).cyan()
    );
    println!();

    if table.rows().is_empty() {
        println!("  {}", style("No volumes configured").dim());
        println!();
        println!("  Add one per line:");
        println!("    {}", style("vol0 janedoe@host:/home/janedoe").cyan());
        println!("    {}", style("alias v0 vol0").cyan());
        println!();
        return Ok(0);
    }

    println!(
        "  {:<20} {:<40} {}",
        style("Name").bold(),
        style("Remote").bold(),
        style("Status").bold()
    );
    println!("  {}", style("─".repeat(80)).dim());

    for row in table.rows() {
        match row {
            Row::Volume { name, remote, .. } => {
                let status = match MountPoint::new(&base, name) {
                    Ok(mp) => match mp.state(&mounts) {
                        MountState::Mounted => style(format!("● {}", MountState::Mounted)).green(),
                        state => style(format!("○ {}", state)).dim(),
                    },
                    Err(_) => style("✕ invalid name".to_string()).red(),
                };

                println!(
                    "  {:<20} {:<40} {}",
                    truncate(name, 18),
                    truncate(remote, 38),
                    status
                );
            }
            Row::Alias { alias, target, .. } => {
                println!(
                    "  {:<20} {}",
                    truncate(alias, 18),
                    style(format!("alias → {}", target)).cyan()
                );
            }
            Row::Malformed { line, fields } => {
                println!(
                    "  {:<20} {}",
                    truncate(fields.first().map(String::as_str).unwrap_or(""), 18),
                    style(format!(
                        "malformed (line {}, {} fields)",
                        line,
                        fields.len()
                    ))
                    .yellow()
                );
            }
        }
    }

    println!();
    Ok(0)
}
