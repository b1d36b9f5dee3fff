//! Unmount output

use std::path::Path;

use console::style;

use crate::volume::{BatchOutcome, Request};

pub(super) fn print_unmounted(path: &Path) {
    println!(
        "  {} {} unmounted",
        style("✓").green().bold(),
        style(path.display()).white()
    );
}

pub(super) fn summary(outcome: &BatchOutcome, request: &Request) {
    if let Request::UnmountAll = request {
        if outcome.is_success() {
            println!("  {} Unmounted all sshfs volumes", style("✓").green().bold());
        } else {
            eprintln!("  {} Failed to unmount all sshfs volumes", style("✕").red().bold());
        }
        return;
    }

    if outcome.succeeded > 0 {
        println!();
        println!(
            "  {} Unmounted {} volume(s)",
            style("✓").green().bold(),
            outcome.succeeded
        );
    }

    if outcome.failed() > 0 {
        eprintln!();
        eprintln!(
            "  {} Failed to unmount {} volume(s)",
            style("✕").red().bold(),
            outcome.failed()
        );
    }
}
