//! replace-branding command - Replace master pages and page layouts

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};

use super::{connect, load_config, runtime};
use crate::core::config::Config;
use crate::core::settings::Settings;
use crate::engine::branding::{self, BrandingJob};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Replace the branding assets declared in the settings document.
pub fn replace_branding(ctx: &Context, settings: Option<&Path>) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = load_config(ctx)?;

    let path = settings_path(settings, &config)?;
    let settings = Settings::load(&path)?;
    if settings.is_empty() {
        output::warn(
            format!("{} declares no master pages or page layouts", path.display()),
            verbosity,
        );
    }

    let job = BrandingJob::from_config(&config);
    let client = connect(ctx, &config)?;
    output::print(
        format!(
            "Replacing {} master page(s) and {} page layout(s) ...",
            settings.master_pages.len(),
            settings.page_layouts.len()
        ),
        verbosity,
    );

    let report = runtime()?
        .block_on(branding::replace_branding(&client, &settings, &job))
        .context("branding replacement failed")?;

    output::print(output::format_branding_report(&report), verbosity);
    Ok(())
}

/// `--settings` if given, else `branding.settings` resolved against the
/// config file's directory.
fn settings_path(flag: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    let configured = config.settings_path().map(PathBuf::from).ok_or_else(|| {
        anyhow!("no settings document: pass --settings or set branding.settings in the config file")
    })?;

    match config.loaded_from().and_then(Path::parent) {
        Some(dir) if configured.is_relative() => Ok(dir.join(configured)),
        _ => Ok(configured),
    }
}
