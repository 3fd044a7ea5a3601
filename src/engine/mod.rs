//! engine
//!
//! Reconciliation, migration and publishing workflow.
//!
//! # Architecture
//!
//! The engine owns no state. Every entity is read from the
//! [`RepositoryClient`](crate::remote::RepositoryClient) when it is needed
//! and every change is flushed through an explicit batch:
//!
//! 1. **Reconcile**: align a target list's content types and views with a source
//! 2. **Migrate**: copy a folder's documents under a new root
//! 3. **Workflow**: check out, check in, publish and approve single documents
//! 4. **Rewrite**: point the site and its pages at replacement assets
//!
//! The two jobs, [`lists::replace_lists`] and
//! [`branding::replace_branding`], wire these together.
//!
//! # Invariants
//!
//! - Calls to the repository are strictly sequential
//! - Empty batches are never sent
//! - Nothing is retried; the first failure aborts the job and completed
//!   steps stay committed
//!
//! # Example
//!
//! ```ignore
//! use sitegraft::engine::lists::{replace_lists, ListJob};
//!
//! let report = replace_lists(&client, &ListJob::from_config(&config)).await?;
//! println!("replaced {} list(s)", report.replaced.len());
//! ```

pub mod branding;
pub mod lists;
pub mod migrate;
pub mod reconcile;
pub mod rewrite;
pub mod workflow;

pub use migrate::{migrate_documents, MigrationReport};
pub use reconcile::{
    keyed_diff, reconcile, reconcile_content_types, reconcile_views, ContentTypes, KeyedDiff,
    ReconcileReport, SchemaCollection, Views,
};
pub use workflow::{DocumentWorkflow, WorkflowStep};

use std::path::PathBuf;

use crate::core::layouts::LayoutError;
use crate::core::settings::SettingsError;
use crate::core::types::{ServerPath, TypeError};
use crate::remote::RepoError;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Gateway endpoint override.
    pub endpoint: Option<String>,
    /// Explicit config file.
    pub config: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A referenced content type does not exist where it must.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A checkout, check-in, publish or approve step failed.
    #[error("{step} failed for {path}: {source}")]
    Workflow {
        step: WorkflowStep,
        path: ServerPath,
        #[source]
        source: RepoError,
    },

    /// Repository call failed.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Settings document could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A site layout property could not be parsed.
    #[error("invalid page layout property: {0}")]
    Layout(#[from] LayoutError),

    /// A path could not be built.
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    /// The replacement title is held by a list that is not a leftover replacement.
    #[error(
        "cannot replace '{list}': list '{replacement}' already exists with template {template}"
    )]
    ReplacementTitleTaken {
        list: String,
        replacement: String,
        template: u32,
    },

    /// A document was listed outside the folder it was read from.
    #[error("{path} is not under {root}")]
    PathOutsideRoot { path: ServerPath, root: ServerPath },

    /// A local asset file could not be read.
    #[error("failed to read asset '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
