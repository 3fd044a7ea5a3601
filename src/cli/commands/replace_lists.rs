//! replace-lists command - Replace lists built from a deprecated template

use anyhow::{bail, Context as _, Result};

use super::{connect, load_config, runtime};
use crate::engine::lists::{self, ListJob};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Replace every list built from the deprecated template.
///
/// `template` and `suffix` override the configured values.
pub fn replace_lists(ctx: &Context, template: Option<u32>, suffix: Option<&str>) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = load_config(ctx)?;

    let mut job = ListJob::from_config(&config);
    if let Some(template) = template {
        job.deprecated_template = template;
    }
    if let Some(suffix) = suffix {
        if suffix.trim().is_empty() {
            bail!("--suffix cannot be empty");
        }
        job.replacement_suffix = suffix.to_string();
    }
    if job.deprecated_template == job.replacement_template {
        bail!(
            "template {} is also the replacement template; nothing would change",
            job.deprecated_template
        );
    }

    let client = connect(ctx, &config)?;
    output::print(
        format!(
            "Replacing lists built from template {} ...",
            job.deprecated_template
        ),
        verbosity,
    );

    let report = runtime()?
        .block_on(lists::replace_lists(&client, &job))
        .context("list replacement failed")?;

    output::print(output::format_list_report(&report), verbosity);
    Ok(())
}
