//! engine::workflow
//!
//! Drive a single document through checkout, check-in, publish and approve.
//!
//! # States
//!
//! ```text
//! NotCheckedOut -> CheckedOut -> Draft -> Published -> Approved
//! ```
//!
//! Every guarded step re-reads the document before acting, so a document
//! that already reached a later state is left alone. A document another
//! user left checked out is taken over by undoing that checkout and
//! checking it out again.
//!
//! Steps are never retried. A failing step aborts the rest and leaves the
//! document where it was; the next run's [`DocumentWorkflow::ensure_checked_out`]
//! recovers it.

use tracing::{debug, info};

use super::EngineError;
use crate::core::config::DEFAULT_COMMENT;
use crate::core::types::{ModerationStatus, PublishLevel, ServerPath};
use crate::remote::{Batch, CheckInKind, DocumentRef, Mutation, RepoError, RepositoryClient};

/// A workflow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    CheckOut,
    CheckIn,
    Publish,
    Approve,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStep::CheckOut => write!(f, "check out"),
            WorkflowStep::CheckIn => write!(f, "check in"),
            WorkflowStep::Publish => write!(f, "publish"),
            WorkflowStep::Approve => write!(f, "approve"),
        }
    }
}

/// Workflow controller bound to a client and a comment.
#[derive(Clone, Copy)]
pub struct DocumentWorkflow<'a> {
    client: &'a dyn RepositoryClient,
    comment: &'a str,
}

impl std::fmt::Debug for DocumentWorkflow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWorkflow")
            .field("client", &self.client.name())
            .field("comment", &self.comment)
            .finish()
    }
}

impl<'a> DocumentWorkflow<'a> {
    /// A controller using `comment` for check-in, publish and approve.
    pub fn new(client: &'a dyn RepositoryClient, comment: &'a str) -> Self {
        Self { client, comment }
    }

    /// A controller using the default comment.
    pub fn with_default_comment(client: &'a dyn RepositoryClient) -> Self {
        Self::new(client, DEFAULT_COMMENT)
    }

    pub fn client(&self) -> &'a dyn RepositoryClient {
        self.client
    }

    pub fn comment(&self) -> &str {
        self.comment
    }

    /// Make sure the current user holds the checkout of `path`.
    ///
    /// A missing document is left alone (it is about to be created). A
    /// document checked out by anyone is released and checked out again in
    /// one batch.
    pub async fn ensure_checked_out(&self, path: &ServerPath) -> Result<(), EngineError> {
        let Some(doc) = self.client.document(path).await? else {
            debug!(path = %path, "document does not exist yet, nothing to check out");
            return Ok(());
        };

        let mut batch = Batch::new();
        if doc.checkout.is_checked_out() {
            info!(path = %path, state = %doc.checkout, "taking over existing checkout");
            batch.push(Mutation::UndoCheckOut { path: path.clone() });
        }
        batch.push(Mutation::CheckOut { path: path.clone() });

        self.run(WorkflowStep::CheckOut, path, batch).await
    }

    /// Check in, publish and approve `path` as far as it still needs.
    ///
    /// # Errors
    ///
    /// `Workflow` if the document does not exist or any step fails.
    pub async fn finalize(&self, path: &ServerPath) -> Result<(), EngineError> {
        let doc = self.require(WorkflowStep::CheckIn, path).await?;
        if doc.checkout.is_checked_out() {
            debug!(path = %path, "checking in major version");
            self.run(
                WorkflowStep::CheckIn,
                path,
                Batch::single(Mutation::CheckIn {
                    path: path.clone(),
                    comment: self.comment.to_string(),
                    kind: CheckInKind::Major,
                }),
            )
            .await?;
        }

        let doc = self.require(WorkflowStep::Publish, path).await?;
        if doc.level == PublishLevel::Draft {
            debug!(path = %path, "publishing");
            self.run(
                WorkflowStep::Publish,
                path,
                Batch::single(Mutation::Publish {
                    path: path.clone(),
                    comment: self.comment.to_string(),
                }),
            )
            .await?;
        }

        let doc = self.require(WorkflowStep::Approve, path).await?;
        if doc.moderation == ModerationStatus::Pending {
            debug!(path = %path, "approving");
            self.run(
                WorkflowStep::Approve,
                path,
                Batch::single(Mutation::Approve {
                    path: path.clone(),
                    comment: self.comment.to_string(),
                }),
            )
            .await?;
        }

        Ok(())
    }

    /// Re-read `path`; a missing document fails `step`.
    async fn require(
        &self,
        step: WorkflowStep,
        path: &ServerPath,
    ) -> Result<DocumentRef, EngineError> {
        self.client
            .document(path)
            .await?
            .ok_or_else(|| EngineError::Workflow {
                step,
                path: path.clone(),
                source: RepoError::NotFound(format!("document {}", path)),
            })
    }

    async fn run(
        &self,
        step: WorkflowStep,
        path: &ServerPath,
        batch: Batch,
    ) -> Result<(), EngineError> {
        self.client
            .execute(batch)
            .await
            .map_err(|source| EngineError::Workflow {
                step,
                path: path.clone(),
                source,
            })
    }
}
