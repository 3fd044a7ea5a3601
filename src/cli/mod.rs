//! cli
//!
//! Command-line interface layer for sitegraft.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//! - Does NOT build repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug, cli.quiet);

    let ctx = engine::Context {
        endpoint: cli.endpoint.clone(),
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Default log filter for the given flags. `RUST_LOG` overrides it.
pub fn default_filter(debug: bool, quiet: bool) -> &'static str {
    if debug {
        "sitegraft=debug"
    } else if quiet {
        "sitegraft=warn"
    } else {
        "sitegraft=info"
    }
}

/// Install the stderr log subscriber. Safe to call more than once.
fn init_logging(debug: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
