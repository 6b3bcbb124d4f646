//! Music Linker command-line entry point.

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use music_linker::cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("music_linker=info".parse()?))
        .init();

    let rt = Runtime::new()?;
    cli::run_command(&args, &rt)
}
