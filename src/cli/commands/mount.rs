//! Mount output
//!
//! Per-volume lines and the summary printed after a mount request.

use std::path::Path;

use console::style;

use crate::volume::BatchOutcome;

pub(super) fn print_mounted(remote: &str, path: &Path) {
    println!(
        "  {} {} → {}",
        style("✓").green().bold(),
        style(remote).white(),
        style(path.display()).green()
    );
}

pub(super) fn summary(outcome: &BatchOutcome) {
    if outcome.attempted == 0 {
        println!("  {}", style("No volumes in the volume table").dim());
        println!();
        println!("  Add one per line:");
        println!("    {}", style("vol0 janedoe@host:/home/janedoe").cyan());
        println!("    {}", style("alias v0 vol0").cyan());
        return;
    }

    if outcome.succeeded > 0 {
        println!();
        println!(
            "  {} Mounted {} volume(s)",
            style("✓").green().bold(),
            outcome.succeeded
        );
    }

    if outcome.failed() > 0 {
        eprintln!();
        eprintln!(
            "  {} Failed to mount {} volume(s)",
            style("✕").red().bold(),
            outcome.failed()
        );
    }
}
