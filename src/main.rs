//! CLI entry point for the photomosaic builder

use clap::Parser;
use std::process::ExitCode;
use tessera::io::cli::{Cli, MosaicRunner};
use tracing::Level;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.quiet { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut runner = MosaicRunner::new(cli);
    match runner.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
