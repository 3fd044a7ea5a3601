//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--endpoint <url>`: Gateway endpoint (overrides the config file)
//! - `--config <path>`: Config file to use instead of the standard locations
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitegraft - Replace list templates and branding assets in a content repository
#[derive(Parser, Debug)]
#[command(name = "sitegraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository gateway endpoint (e.g. http://w15-sp/sites/ftclab)
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Config file to load
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace master pages and page layouts across the site
    #[command(
        name = "replace-branding",
        long_about = "Replace master pages and page layouts across the site.\n\n\
            Uploads every asset declared in the settings document into the master \
            page gallery, checks it in, publishes and approves it, then repoints the \
            site's master page references, the available page layouts, and every \
            page of the pages library that used a replaced layout.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Replace branding using settings.xml next to the asset files
    sitegraft replace-branding --settings branding/settings.xml

    # Against a specific site
    sitegraft --endpoint http://w15-sp/sites/ftclab replace-branding --settings settings.xml

SETTINGS FORMAT:
    <branding>
      <masterPage file=\"contoso.master\" replaces=\"seattle.master\" />
      <pageLayout file=\"ContosoArticle.aspx\" replaces=\"ArticleLeft.aspx\"
                  title=\"Contoso Article\" associatedContentTypeName=\"Article Page\"
                  defaultLayout=\"true\" />
    </branding>"
    )]
    ReplaceBranding {
        /// Settings document (defaults to branding.settings from the config)
        #[arg(long, value_name = "PATH")]
        settings: Option<PathBuf>,
    },

    /// Replace lists built from the deprecated list template
    #[command(
        name = "replace-lists",
        long_about = "Replace lists built from the deprecated list template.\n\n\
            For every such list a replacement library is created, its versioning \
            settings, content types and views are aligned with the original, and the \
            original's top-level documents are copied over. The original list is left \
            untouched.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Replace every list created from template 10003 with '<title>App'
    sitegraft replace-lists

    # Use a different template and suffix
    sitegraft replace-lists --template 10050 --suffix V2"
    )]
    ReplaceLists {
        /// Template id of the lists to replace (overrides the config)
        #[arg(long, value_name = "ID")]
        template: Option<u32>,

        /// Suffix appended to replacement titles (overrides the config)
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    sitegraft completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    sitegraft completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
