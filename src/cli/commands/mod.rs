//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and applies CLI overrides
//! 2. Connects to the repository gateway
//! 3. Calls the engine to execute the job
//! 4. Formats and displays output
//!
//! Handlers do NOT build mutations themselves.
//!
//! # Async Commands
//!
//! The engine is async because every repository call is network I/O.
//! Handlers stay synchronous and drive the engine on a current-thread
//! runtime; calls are strictly sequential, so no worker threads are needed.

mod completion;
mod replace_branding;
mod replace_lists;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use replace_branding::replace_branding;
pub use replace_lists::replace_lists;

use anyhow::{anyhow, Context as _, Result};
use tracing::debug;

use super::args::Command;
use crate::core::config::schema::validate_endpoint;
use crate::core::config::Config;
use crate::engine::Context;
use crate::remote::http::HttpRepository;

/// Environment variable holding the gateway bearer token.
pub const TOKEN_ENV: &str = "SITEGRAFT_TOKEN";

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::ReplaceBranding { settings } => replace_branding(ctx, settings.as_deref()),
        Command::ReplaceLists { template, suffix } => {
            replace_lists(ctx, template, suffix.as_deref())
        }
        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration honoring `--config`.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let config = Config::load(ctx.config.as_deref()).context("failed to load configuration")?;
    match config.loaded_from() {
        Some(path) => debug!(path = %path.display(), "loaded config"),
        None => debug!("no config file found, using defaults"),
    }
    Ok(config)
}

/// Build the gateway client. `--endpoint` wins over the config file; the
/// token comes from the environment, then the config file.
pub(crate) fn connect(ctx: &Context, config: &Config) -> Result<HttpRepository> {
    let endpoint = ctx
        .endpoint
        .as_deref()
        .or(config.endpoint())
        .ok_or_else(|| {
            anyhow!("no endpoint configured: pass --endpoint or set `endpoint` in the config file")
        })?;
    validate_endpoint(endpoint)?;

    let token = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty())
        .or_else(|| config.token().map(str::to_string));
    if token.is_none() {
        debug!("no token configured, sending unauthenticated requests");
    }

    Ok(HttpRepository::new(endpoint, token)?)
}

/// Runtime used to drive the engine.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
