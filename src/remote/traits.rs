//! remote::traits
//!
//! Repository client trait and the entity records it returns.
//!
//! # Design
//!
//! The `RepositoryClient` trait is async because every operation is a
//! network round trip. Reads return freshly materialized records; nothing
//! is cached between calls. Mutations are never applied one by one: they
//! are queued into a [`Batch`] and only take effect when the batch is
//! explicitly executed.
//!
//! # Example
//!
//! ```ignore
//! use sitegraft::remote::{Batch, Mutation, RepositoryClient, RepoError};
//!
//! async fn rename_master(client: &dyn RepositoryClient) -> Result<(), RepoError> {
//!     let site = client.site().await?;
//!     println!("current master page: {}", site.master_url);
//!
//!     let batch = Batch::single(Mutation::UpdateSite {
//!         master_url: Some("/_catalogs/masterpage/contoso.master".into()),
//!         custom_master_url: None,
//!     });
//!     client.execute(batch).await
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::batch::Batch;
use crate::core::types::{CheckoutState, ModerationStatus, PublishLevel, ServerPath, ViewKind};

/// Errors from repository operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested list, view, content type or document was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with the current state (e.g. already checked out).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The service returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// A batch was refused; `index` is the position of the failing mutation.
    #[error("batch rejected at mutation {index}: {message}")]
    Rejected { index: usize, message: String },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl RepoError {
    /// Whether this error only says the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound(_))
    }
}

/// Turn a `NotFound` into success; every other error still propagates.
///
/// Used where deleting an artifact that is already gone is fine, such as
/// cleaning up after an earlier run.
pub fn ignore_not_found(result: Result<(), RepoError>) -> Result<bool, RepoError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Who may see draft versions of a list's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftVisibility {
    #[default]
    Reader,
    Author,
    Approver,
}

/// Versioning and moderation settings of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListSettings {
    pub enable_versioning: bool,
    pub enable_moderation: bool,
    pub enable_minor_versions: bool,
    pub draft_visibility: DraftVisibility,
}

/// A list as returned by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub title: String,
    /// Template the list was created from
    pub template: u32,
}

/// A content type attached to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeRef {
    /// Identity key within a list
    pub name: String,
    /// Opaque id of this (list-level) content type
    pub id: String,
    /// Id of the site-level definition this one was attached from
    pub parent: Option<String>,
}

/// A list view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    /// Identity key within a list
    pub title: String,
    pub paged: bool,
    pub personal: bool,
    pub query: String,
    pub row_limit: u32,
    pub default_view: bool,
    pub fields: Vec<String>,
    #[serde(rename = "view_type")]
    pub kind: ViewKind,
}

/// Full schema of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSchema {
    pub title: String,
    pub template: u32,
    /// Root folder of the list
    pub root: ServerPath,
    pub content_types_enabled: bool,
    pub settings: ListSettings,
    pub content_types: Vec<ContentTypeRef>,
    pub views: Vec<ViewDef>,
}

/// A document and its workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub path: ServerPath,
    /// Repository-assigned unique id (a GUID)
    pub unique_id: String,
    pub checkout: CheckoutState,
    pub level: PublishLevel,
    pub moderation: ModerationStatus,
}

/// A URL-valued field (url plus display text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlField {
    pub url: String,
    pub description: String,
}

/// A publishing page and the layout it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub path: ServerPath,
    pub layout: Option<UrlField>,
}

/// Master page references held by the site object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteInfo {
    pub master_url: String,
    pub custom_master_url: String,
}

/// The gallery branding assets are uploaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub root: ServerPath,
    pub content_types: Vec<ContentTypeRef>,
}

/// The repository client.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine still calls them
/// strictly sequentially.
///
/// # Error Handling
///
/// All methods return `Result<T, RepoError>`. Nothing is retried by the
/// client or by its callers.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Client name (e.g. "http", "mock").
    fn name(&self) -> &'static str;

    /// All lists of the site.
    async fn lists(&self) -> Result<Vec<ListSummary>, RepoError>;

    /// Full schema of a list.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no list has that title
    async fn list_schema(&self, title: &str) -> Result<ListSchema, RepoError>;

    /// Content types currently attached to a list.
    async fn content_types(&self, list: &str) -> Result<Vec<ContentTypeRef>, RepoError>;

    /// Views currently defined on a list.
    async fn views(&self, list: &str) -> Result<Vec<ViewDef>, RepoError>;

    /// Documents directly inside a folder (not in its subfolders).
    async fn documents(&self, folder: &ServerPath) -> Result<Vec<DocumentRef>, RepoError>;

    /// A single document, or `None` if nothing exists at `path`.
    async fn document(&self, path: &ServerPath) -> Result<Option<DocumentRef>, RepoError>;

    /// Master page references of the site.
    async fn site(&self) -> Result<SiteInfo, RepoError>;

    /// Site-level content type definitions.
    async fn site_content_types(&self) -> Result<Vec<ContentTypeRef>, RepoError>;

    /// The branding asset gallery.
    async fn gallery(&self) -> Result<Gallery, RepoError>;

    /// Every page of a pages library.
    async fn pages(&self, library: &str) -> Result<Vec<PageRef>, RepoError>;

    /// A site property bag value, or `None` if unset.
    async fn site_property(&self, key: &str) -> Result<Option<String>, RepoError>;

    /// Apply a batch of mutations in order.
    ///
    /// A failing mutation fails the whole call. Callers must not assume
    /// which earlier mutations of the batch took effect.
    async fn execute(&self, batch: Batch) -> Result<(), RepoError>;
}
