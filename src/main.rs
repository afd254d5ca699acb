//! OCX CLI entry point
//!
//! Parses arguments, sets up logging on stderr and runs the command. Failures
//! are rendered with [`user_friendly_error`] and exit with status 1; `ghost
//! run` exits with the status of the command it ran.

use clap::Parser;
use ocx_cli::cli;
use ocx_cli::core::error::user_friendly_error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if cli.no_color() {
        colored::control::set_override(false);
    }

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Some(level) = cli.log_level() {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.execute().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
