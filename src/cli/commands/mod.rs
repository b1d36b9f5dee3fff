//! Command implementations
//!
//! Each command returns the process exit status for the invocation.

mod list;
mod mount;
mod unmount;

pub use list::{list_mounted, show_table};

use console::style;

use crate::config::AppConfig;
use crate::error::{MountError, Result};
use crate::volume::{
    self, get_install_instructions, Action, BatchOrchestrator, Completed, ItemOutcome,
    MountTransport, Request,
};

/// Run a mount or unmount request and print its summary.
pub async fn run_batch(config: &AppConfig, request: &Request) -> Result<i32> {
    run_with(&volume::orchestrator(config), request).await
}

async fn run_with<T: MountTransport>(
    orchestrator: &BatchOrchestrator<T>,
    request: &Request,
) -> Result<i32> {
    ensure_available(orchestrator.manager().transport())?;

    println!();
    let outcome = orchestrator.run(request, print_item).await?;

    match outcome.action {
        Action::Mount => mount::summary(&outcome),
        Action::Unmount => unmount::summary(&outcome, request),
    }
    println!();

    Ok(outcome.exit_status())
}

/// Fail before doing anything when the helper binary is missing.
fn ensure_available<T: MountTransport>(transport: &T) -> Result<()> {
    if transport.is_available() {
        return Ok(());
    }

    eprintln!();
    eprintln!("{}", get_install_instructions());
    eprintln!();
    Err(MountError::TransportUnavailable(transport.name().to_string()))
}

fn print_item(item: &ItemOutcome) {
    match &item.result {
        Ok(Completed::Mounted { remote, path }) => mount::print_mounted(remote, path),
        Ok(Completed::Unmounted { path }) => unmount::print_unmounted(path),
        // Reported by the summary line
        Ok(Completed::UnmountedAll) => {}
        Err(e) => {
            eprintln!("  {} {} - {}", style("✕").red().bold(), item.name, e);
        }
    }
}
