//! Pinpick CLI binary.
//!
//! Entry point for the `pinpick` command-line tool. Parses arguments with
//! `clap`, initializes logging via `tracing`, and dispatches to the command
//! handlers.

mod cli;
mod commands;

use miette::Result;

fn main() -> Result<()> {
    let args = cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    commands::dispatch(args)
}
