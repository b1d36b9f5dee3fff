mod cli;
mod config;
mod error;
mod volume;

use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sshmount=debug"
    } else {
        "sshmount=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let status = match cli.execute().await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(status);
}
