//! engine::migrate
//!
//! Copy a folder's documents under a new root.
//!
//! Only the direct children of the source folder are copied; nested folders
//! stay behind. Destination paths keep everything below the source root.
//! All copies go out as a single overwriting batch, so one failing copy
//! fails the whole migration and nothing is retried.

use tracing::{debug, info};

use super::EngineError;
use crate::core::paths::rebase;
use crate::core::types::ServerPath;
use crate::remote::{Batch, Mutation, RepositoryClient};

/// Documents copied by a migration, as (source, destination) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub copied: Vec<(ServerPath, ServerPath)>,
}

impl MigrationReport {
    pub fn len(&self) -> usize {
        self.copied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}

/// Copy every document directly inside `source_root` under `destination_root`.
pub async fn migrate_documents(
    client: &dyn RepositoryClient,
    source_root: &ServerPath,
    destination_root: &ServerPath,
) -> Result<MigrationReport, EngineError> {
    let documents = client.documents(source_root).await?;

    let mut batch = Batch::new();
    let mut report = MigrationReport::default();

    for doc in documents {
        let destination = rebase(&doc.path, source_root, destination_root).ok_or_else(|| {
            EngineError::PathOutsideRoot {
                path: doc.path.clone(),
                root: source_root.clone(),
            }
        })?;

        debug!(from = %doc.path, to = %destination, "queueing copy");
        batch.push(Mutation::CopyDocument {
            source: doc.path.clone(),
            destination: destination.clone(),
            overwrite: true,
        });
        report.copied.push((doc.path, destination));
    }

    if batch.is_empty() {
        debug!(root = %source_root, "no documents to migrate");
        return Ok(report);
    }

    info!(
        from = %source_root,
        to = %destination_root,
        count = batch.len(),
        "migrating documents"
    );
    client.execute(batch).await?;

    Ok(report)
}
