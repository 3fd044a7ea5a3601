//! engine::reconcile
//!
//! Drive a target list's named schema collections toward a source's.
//!
//! # Algorithm
//!
//! Items are matched by identity key only (content type name, view title).
//! Items present on both sides are never touched, even when their other
//! attributes differ. Reconciling one collection runs in two phases:
//!
//! 1. Attach every source item missing from the target, flush.
//! 2. Re-read the target, detach every item the source lacks, flush.
//!
//! Additions go first so a list is never left without a content type it
//! still needs. An empty phase sends nothing, which makes a second run
//! against an unchanged source a no-op.

use std::collections::HashSet;
use std::hash::Hash;

use async_trait::async_trait;
use tracing::{debug, info};

use super::EngineError;
use crate::remote::{
    Batch, ContentTypeRef, ListSchema, Mutation, RepoError, RepositoryClient, ViewDef,
};

/// Items to add to and remove from a target collection.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyedDiff<'a, T> {
    /// Source items whose key the target lacks, in source order.
    pub to_add: Vec<&'a T>,
    /// Target items whose key the source lacks, in target order.
    pub to_remove: Vec<&'a T>,
}

impl<T> KeyedDiff<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Keyed set difference of two collections.
///
/// ```
/// use sitegraft::engine::keyed_diff;
///
/// let source = vec!["Document".to_string(), "Article Page".to_string()];
/// let target = vec!["Document".to_string(), "Folder".to_string()];
/// let diff = keyed_diff(&source, &target, |s| s.as_str());
///
/// assert_eq!(diff.to_add, vec!["Article Page"]);
/// assert_eq!(diff.to_remove, vec!["Folder"]);
/// ```
pub fn keyed_diff<'a, T, K, F>(source: &'a [T], target: &'a [T], key: F) -> KeyedDiff<'a, T>
where
    K: Eq + Hash,
    F: Fn(&'a T) -> K,
{
    let source_keys: HashSet<K> = source.iter().map(&key).collect();
    let target_keys: HashSet<K> = target.iter().map(&key).collect();

    KeyedDiff {
        to_add: source
            .iter()
            .filter(|item| !target_keys.contains(&key(*item)))
            .collect(),
        to_remove: target
            .iter()
            .filter(|item| !source_keys.contains(&key(*item)))
            .collect(),
    }
}

/// A named collection on a list that can be reconciled.
#[async_trait]
pub trait SchemaCollection {
    type Item: Send + Sync;

    /// Collection name for diagnostics.
    const NAME: &'static str;

    /// Identity key of an item.
    fn key(item: &Self::Item) -> &str;

    /// The collection as carried by a list schema.
    fn source(schema: &ListSchema) -> &[Self::Item];

    /// Read the collection's current state from a list.
    async fn read(client: &dyn RepositoryClient, list: &str)
        -> Result<Vec<Self::Item>, RepoError>;

    /// Mutation attaching a source item to `list`.
    fn add(list: &str, item: &Self::Item) -> Result<Mutation, EngineError>;

    /// Mutation detaching a target item from `list`.
    fn remove(list: &str, item: &Self::Item) -> Mutation;
}

/// Content types of a list, keyed by name.
#[derive(Debug)]
pub struct ContentTypes;

#[async_trait]
impl SchemaCollection for ContentTypes {
    type Item = ContentTypeRef;

    const NAME: &'static str = "content types";

    fn key(item: &ContentTypeRef) -> &str {
        &item.name
    }

    fn source(schema: &ListSchema) -> &[ContentTypeRef] {
        &schema.content_types
    }

    async fn read(
        client: &dyn RepositoryClient,
        list: &str,
    ) -> Result<Vec<ContentTypeRef>, RepoError> {
        client.content_types(list).await
    }

    /// Attaches the site-level definition the source's copy came from.
    fn add(list: &str, item: &ContentTypeRef) -> Result<Mutation, EngineError> {
        let parent = item.parent.clone().ok_or_else(|| {
            EngineError::SchemaMismatch(format!(
                "content type '{}' has no site-level definition to attach to '{}'",
                item.name, list
            ))
        })?;
        Ok(Mutation::AddContentType {
            list: list.to_string(),
            content_type_id: parent,
        })
    }

    fn remove(list: &str, item: &ContentTypeRef) -> Mutation {
        Mutation::RemoveContentType {
            list: list.to_string(),
            content_type_id: item.id.clone(),
        }
    }
}

/// Views of a list, keyed by title.
#[derive(Debug)]
pub struct Views;

#[async_trait]
impl SchemaCollection for Views {
    type Item = ViewDef;

    const NAME: &'static str = "views";

    fn key(item: &ViewDef) -> &str {
        &item.title
    }

    fn source(schema: &ListSchema) -> &[ViewDef] {
        &schema.views
    }

    async fn read(client: &dyn RepositoryClient, list: &str) -> Result<Vec<ViewDef>, RepoError> {
        client.views(list).await
    }

    fn add(list: &str, item: &ViewDef) -> Result<Mutation, EngineError> {
        Ok(Mutation::AddView {
            list: list.to_string(),
            view: item.clone(),
        })
    }

    fn remove(list: &str, item: &ViewDef) -> Mutation {
        Mutation::RemoveView {
            list: list.to_string(),
            title: item.title.clone(),
        }
    }
}

/// Keys added to and removed from a target collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    /// Whether the target already matched.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile one collection of list `target` with `source`.
pub async fn reconcile<C: SchemaCollection>(
    client: &dyn RepositoryClient,
    source: &ListSchema,
    target: &str,
) -> Result<ReconcileReport, EngineError> {
    let wanted = C::source(source);
    let mut report = ReconcileReport::default();

    let current = C::read(client, target).await?;
    let diff = keyed_diff(wanted, &current, C::key);
    let additions = diff
        .to_add
        .iter()
        .map(|item| C::add(target, item))
        .collect::<Result<Batch, _>>()?;
    report.added = diff.to_add.iter().map(|item| C::key(item).to_string()).collect();

    if !additions.is_empty() {
        info!(list = target, count = additions.len(), "adding {}", C::NAME);
        client.execute(additions).await?;
    }

    let current = C::read(client, target).await?;
    let diff = keyed_diff(wanted, &current, C::key);
    let removals: Batch = diff.to_remove.iter().map(|item| C::remove(target, item)).collect();
    report.removed = diff
        .to_remove
        .iter()
        .map(|item| C::key(item).to_string())
        .collect();

    if !removals.is_empty() {
        info!(list = target, count = removals.len(), "removing {}", C::NAME);
        client.execute(removals).await?;
    }

    if report.is_noop() {
        debug!(list = target, "{} already match", C::NAME);
    }

    Ok(report)
}

/// Reconcile the content types of list `target` with `source`.
///
/// Does nothing when the source does not use content types. Otherwise
/// content types are enabled on the target first.
pub async fn reconcile_content_types(
    client: &dyn RepositoryClient,
    source: &ListSchema,
    target: &str,
) -> Result<ReconcileReport, EngineError> {
    if !source.content_types_enabled {
        debug!(list = %source.title, "content types disabled on source, skipping");
        return Ok(ReconcileReport::default());
    }

    if !client.list_schema(target).await?.content_types_enabled {
        debug!(list = target, "enabling content types");
        client
            .execute(Batch::single(Mutation::EnableContentTypes {
                list: target.to_string(),
            }))
            .await?;
    }

    reconcile::<ContentTypes>(client, source, target).await
}

/// Reconcile the views of list `target` with `source`.
pub async fn reconcile_views(
    client: &dyn RepositoryClient,
    source: &ListSchema,
    target: &str,
) -> Result<ReconcileReport, EngineError> {
    reconcile::<Views>(client, source, target).await
}
