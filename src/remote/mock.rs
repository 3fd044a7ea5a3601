//! remote::mock
//!
//! In-memory repository for deterministic testing.
//!
//! # Design
//!
//! The mock keeps lists, files, site properties and the asset gallery in
//! memory and applies batches atomically: every mutation is applied to a
//! staged copy and the copy only replaces the live state once the whole
//! batch succeeded. Every read and every attempted batch is recorded so
//! tests can assert exactly which round trips happened.
//!
//! Workflow rules follow the repository's behavior closely enough to catch
//! ordering mistakes: checking out an already checked-out file conflicts,
//! check-in requires the caller's own checkout, publish requires a draft,
//! approve requires a pending document, and page layout changes require
//! the page to be checked out.
//!
//! # Example
//!
//! ```
//! use sitegraft::remote::mock::{MockFile, MockRepository};
//! use sitegraft::remote::{Batch, Mutation, RepositoryClient};
//! use sitegraft::core::types::{CheckoutState, ServerPath};
//!
//! # tokio_test::block_on(async {
//! let repo = MockRepository::new().with_file(MockFile::new("/Docs/a.txt"));
//! let path = ServerPath::new("/Docs/a.txt").unwrap();
//!
//! repo.execute(Batch::single(Mutation::CheckOut { path: path.clone() }))
//!     .await
//!     .unwrap();
//!
//! let doc = repo.document(&path).await.unwrap().unwrap();
//! assert_eq!(doc.checkout, CheckoutState::CheckedOutToUser);
//! assert_eq!(repo.mutations().len(), 1);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::batch::{Batch, CheckInKind, Mutation};
use super::traits::{
    ContentTypeRef, DocumentRef, Gallery, ListSchema, ListSettings, ListSummary, PageRef,
    RepoError, RepositoryClient, SiteInfo, UrlField, ViewDef,
};
use crate::core::config::{DEFAULT_MASTER_PAGE_CONTENT_TYPE, DEFAULT_PAGE_LAYOUT_CONTENT_TYPE};
use crate::core::types::{CheckoutState, ModerationStatus, PublishLevel, ServerPath, ViewKind};

/// Root folder of the mock asset gallery.
pub const GALLERY_ROOT: &str = "/_catalogs/masterpage";

/// Site-level id of the Document content type.
pub const DOCUMENT_CONTENT_TYPE: &str = "0x0101";

/// Site-level id of the Article Page content type.
pub const ARTICLE_PAGE_CONTENT_TYPE: &str =
    "0x010100C568DB52D9D0A14D9B2FDCC96666E9F2007948130EC3DB064584E219954237AF39";

/// Site-level id of the Welcome Page content type.
pub const WELCOME_PAGE_CONTENT_TYPE: &str =
    "0x010100C568DB52D9D0A14D9B2FDCC96666E9F2007948130EC3DB064584E219954237AF390064DEA0F50FC8C147B0B6EA0636C4A7D4";

/// Title of the view every new library starts with.
pub const DEFAULT_VIEW_TITLE: &str = "All Documents";

/// A list held by the mock.
#[derive(Debug, Clone)]
pub struct MockList {
    pub title: String,
    pub template: u32,
    pub root: ServerPath,
    pub content_types_enabled: bool,
    pub settings: ListSettings,
    pub content_types: Vec<ContentTypeRef>,
    pub views: Vec<ViewDef>,
}

impl MockList {
    /// An empty list. Panics if `root` is not a valid server path.
    pub fn new(title: impl Into<String>, template: u32, root: &str) -> Self {
        Self {
            title: title.into(),
            template,
            root: ServerPath::new(root).expect("mock list root must be a valid server path"),
            content_types_enabled: false,
            settings: ListSettings::default(),
            content_types: Vec::new(),
            views: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: ListSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attach a content type; enables content types on the list.
    pub fn with_content_type(mut self, content_type: ContentTypeRef) -> Self {
        self.content_types_enabled = true;
        self.content_types.push(content_type);
        self
    }

    pub fn with_view(mut self, view: ViewDef) -> Self {
        self.views.push(view);
        self
    }

    fn summary(&self) -> ListSummary {
        ListSummary {
            title: self.title.clone(),
            template: self.template,
        }
    }

    fn schema(&self) -> ListSchema {
        ListSchema {
            title: self.title.clone(),
            template: self.template,
            root: self.root.clone(),
            content_types_enabled: self.content_types_enabled,
            settings: self.settings,
            content_types: self.content_types.clone(),
            views: self.views.clone(),
        }
    }
}

/// A file held by the mock.
#[derive(Debug, Clone)]
pub struct MockFile {
    pub doc: DocumentRef,
    pub content: Vec<u8>,
    pub fields: BTreeMap<String, String>,
    pub layout: Option<UrlField>,
}

impl MockFile {
    /// A published, approved, not checked out file with empty content.
    ///
    /// Panics if `path` is not a valid server path.
    pub fn new(path: &str) -> Self {
        Self {
            doc: DocumentRef {
                path: ServerPath::new(path).expect("mock file path must be a valid server path"),
                unique_id: new_guid(),
                checkout: CheckoutState::NotCheckedOut,
                level: PublishLevel::Published,
                moderation: ModerationStatus::Approved,
            },
            content: Vec::new(),
            fields: BTreeMap::new(),
            layout: None,
        }
    }

    pub fn checked_out(mut self, state: CheckoutState) -> Self {
        self.doc.checkout = state;
        self
    }

    pub fn level(mut self, level: PublishLevel) -> Self {
        self.doc.level = level;
        self
    }

    pub fn moderation(mut self, status: ModerationStatus) -> Self {
        self.doc.moderation = status;
        self
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_layout(mut self, url: impl Into<String>, description: impl Into<String>) -> Self {
        self.layout = Some(UrlField {
            url: url.into(),
            description: description.into(),
        });
        self
    }
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail the named read method (e.g. "list_schema").
    Read {
        method: &'static str,
        error: RepoError,
    },
    /// Fail any batch containing a mutation with this name (e.g. "publish").
    Mutation {
        name: &'static str,
        error: RepoError,
    },
}

/// Recorded call for test verification.
#[derive(Debug, Clone)]
pub enum MockOperation {
    Read {
        method: &'static str,
        target: String,
    },
    Execute {
        mutations: Vec<Mutation>,
        committed: bool,
    },
}

#[derive(Debug, Clone)]
struct MockState {
    lists: Vec<MockList>,
    files: BTreeMap<ServerPath, MockFile>,
    site: SiteInfo,
    site_content_types: Vec<ContentTypeRef>,
    gallery: Gallery,
    gallery_moderated: bool,
    properties: BTreeMap<String, String>,
    /// Site content type id → id of a site content type attached along with it
    companions: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MockInner {
    state: MockState,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Mock repository for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockRepository {
    inner: Arc<Mutex<MockInner>>,
}

impl MockRepository {
    /// A site with a moderated asset gallery, the standard site content
    /// types and both master page references set to `seattle.master`.
    pub fn new() -> Self {
        let gallery_root =
            ServerPath::new(GALLERY_ROOT).expect("gallery root is a valid server path");
        let seattle = format!("{}/seattle.master", GALLERY_ROOT);

        let state = MockState {
            lists: Vec::new(),
            files: BTreeMap::new(),
            site: SiteInfo {
                master_url: seattle.clone(),
                custom_master_url: seattle,
            },
            site_content_types: vec![
                site_content_type("Document", DOCUMENT_CONTENT_TYPE),
                site_content_type("Folder", "0x0120"),
                site_content_type("Article Page", ARTICLE_PAGE_CONTENT_TYPE),
                site_content_type("Welcome Page", WELCOME_PAGE_CONTENT_TYPE),
            ],
            gallery: Gallery {
                root: gallery_root,
                content_types: vec![
                    ContentTypeRef {
                        name: "Master Page".into(),
                        id: format!("{}00B45822D4B60B7B40A2BFCC0995839404", DEFAULT_MASTER_PAGE_CONTENT_TYPE),
                        parent: Some(DEFAULT_MASTER_PAGE_CONTENT_TYPE.into()),
                    },
                    ContentTypeRef {
                        name: "Page Layout".into(),
                        id: format!("{}00F6C5B5B2E5C04B4E9E0B0C0E4C1D2A31", DEFAULT_PAGE_LAYOUT_CONTENT_TYPE),
                        parent: Some(DEFAULT_PAGE_LAYOUT_CONTENT_TYPE.into()),
                    },
                ],
            },
            gallery_moderated: true,
            properties: BTreeMap::new(),
            companions: BTreeMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(MockInner {
                state,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn update(self, f: impl FnOnce(&mut MockState)) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            f(&mut inner.state);
        }
        self
    }

    pub fn with_list(self, list: MockList) -> Self {
        self.update(|s| s.lists.push(list))
    }

    pub fn with_file(self, file: MockFile) -> Self {
        self.update(|s| {
            s.files.insert(file.doc.path.clone(), file);
        })
    }

    pub fn with_site(self, site: SiteInfo) -> Self {
        self.update(|s| s.site = site)
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.update(|s| {
            s.properties.insert(key, value);
        })
    }

    pub fn with_site_content_type(self, content_type: ContentTypeRef) -> Self {
        self.update(|s| s.site_content_types.push(content_type))
    }

    /// Attaching site content type `trigger` to a list also attaches
    /// `companion`, if the list lacks it.
    pub fn with_companion_content_type(
        self,
        trigger: impl Into<String>,
        companion: impl Into<String>,
    ) -> Self {
        let (trigger, companion) = (trigger.into(), companion.into());
        self.update(|s| {
            s.companions.insert(trigger, companion);
        })
    }

    /// Replace the gallery's content types.
    pub fn with_gallery_content_types(self, content_types: Vec<ContentTypeRef>) -> Self {
        self.update(|s| s.gallery.content_types = content_types)
    }

    pub fn with_gallery_moderation(self, moderated: bool) -> Self {
        self.update(|s| s.gallery_moderated = moderated)
    }

    /// Configure the mock to fail a specific call.
    ///
    /// ```
    /// use sitegraft::remote::mock::{FailOn, MockRepository};
    /// use sitegraft::remote::RepoError;
    ///
    /// let repo = MockRepository::new().fail_on(FailOn::Mutation {
    ///     name: "publish",
    ///     error: RepoError::NetworkError("reset".into()),
    /// });
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Mutations of every committed batch, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Execute {
                    mutations,
                    committed: true,
                } => Some(mutations),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Number of `execute` calls, committed or not.
    pub fn execute_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::Execute { .. }))
            .count()
    }

    /// Get a file by path (for test verification).
    pub fn file(&self, path: &str) -> Option<MockFile> {
        let path = ServerPath::new(path).ok()?;
        let inner = self.inner.lock().unwrap();
        inner.state.files.get(&path).cloned()
    }

    /// Get a list schema by title (for test verification).
    pub fn list(&self, title: &str) -> Option<ListSchema> {
        let inner = self.inner.lock().unwrap();
        inner
            .state
            .lists
            .iter()
            .find(|l| l.title == title)
            .map(MockList::schema)
    }

    /// Get the site's master page references (for test verification).
    pub fn site_info(&self) -> SiteInfo {
        let inner = self.inner.lock().unwrap();
        inner.state.site.clone()
    }

    /// Get a site property (for test verification).
    pub fn property(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.state.properties.get(key).cloned()
    }

    fn read<T>(
        &self,
        method: &'static str,
        target: impl Into<String>,
        f: impl FnOnce(&MockState) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::Read {
            method,
            target: target.into(),
        });

        if let Some(FailOn::Read { method: m, error }) = &inner.fail_on {
            if *m == method {
                return Err(error.clone());
            }
        }

        f(&inner.state)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn new_guid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn site_content_type(name: &str, id: &str) -> ContentTypeRef {
    ContentTypeRef {
        name: name.into(),
        id: id.into(),
        parent: None,
    }
}

fn not_found_list(title: &str) -> RepoError {
    RepoError::NotFound(format!("list '{}'", title))
}

impl MockState {
    fn list(&self, title: &str) -> Result<&MockList, RepoError> {
        self.lists
            .iter()
            .find(|l| l.title == title)
            .ok_or_else(|| not_found_list(title))
    }

    fn list_mut(&mut self, title: &str) -> Result<&mut MockList, RepoError> {
        self.lists
            .iter_mut()
            .find(|l| l.title == title)
            .ok_or_else(|| not_found_list(title))
    }

    fn file_mut(&mut self, path: &ServerPath) -> Result<&mut MockFile, RepoError> {
        self.files
            .get_mut(path)
            .ok_or_else(|| RepoError::NotFound(format!("file {}", path)))
    }

    fn moderated(&self, path: &ServerPath) -> bool {
        match self.lists.iter().find(|l| path.starts_with(&l.root)) {
            Some(list) => list.settings.enable_moderation,
            None => self.gallery_moderated && path.starts_with(&self.gallery.root),
        }
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), RepoError> {
        match mutation {
            Mutation::CreateList { title, template } => {
                if self.lists.iter().any(|l| &l.title == title) {
                    return Err(RepoError::Conflict(format!("list '{}' already exists", title)));
                }
                let root = format!("/{}", title.replace(' ', ""));
                let mut list = MockList::new(title.clone(), *template, "/");
                list.root = ServerPath::new(root).map_err(|e| RepoError::ApiError {
                    status: 400,
                    message: e.to_string(),
                })?;
                list.content_types.push(ContentTypeRef {
                    name: "Document".into(),
                    id: format!("{}00{}", DOCUMENT_CONTENT_TYPE, short_id()),
                    parent: Some(DOCUMENT_CONTENT_TYPE.into()),
                });
                list.views.push(ViewDef {
                    title: DEFAULT_VIEW_TITLE.into(),
                    paged: true,
                    personal: false,
                    query: String::new(),
                    row_limit: 30,
                    default_view: true,
                    fields: vec!["DocIcon".into(), "LinkFilename".into(), "Modified".into()],
                    kind: ViewKind::Html,
                });
                self.lists.push(list);
            }

            Mutation::DeleteList { title } => {
                let idx = self
                    .lists
                    .iter()
                    .position(|l| &l.title == title)
                    .ok_or_else(|| not_found_list(title))?;
                let list = self.lists.remove(idx);
                self.files.retain(|path, _| !path.starts_with(&list.root));
            }

            Mutation::UpdateListSettings { list, settings } => {
                self.list_mut(list)?.settings = *settings;
            }

            Mutation::EnableContentTypes { list } => {
                self.list_mut(list)?.content_types_enabled = true;
            }

            Mutation::AddContentType {
                list,
                content_type_id,
            } => {
                let definition = self
                    .site_content_types
                    .iter()
                    .find(|ct| &ct.id == content_type_id)
                    .cloned()
                    .ok_or_else(|| {
                        RepoError::NotFound(format!("site content type {}", content_type_id))
                    })?;
                let target = self.list_mut(list)?;
                if !target.content_types_enabled {
                    return Err(RepoError::Conflict(format!(
                        "content types are not enabled on '{}'",
                        list
                    )));
                }
                if target.content_types.iter().any(|ct| ct.name == definition.name) {
                    return Err(RepoError::Conflict(format!(
                        "'{}' already has content type '{}'",
                        list, definition.name
                    )));
                }
                let companion = self
                    .companions
                    .get(content_type_id)
                    .and_then(|id| self.site_content_types.iter().find(|ct| &ct.id == id))
                    .cloned();

                let target = self.list_mut(list)?;
                for definition in std::iter::once(definition).chain(companion) {
                    if target.content_types.iter().any(|ct| ct.name == definition.name) {
                        continue;
                    }
                    target.content_types.push(ContentTypeRef {
                        name: definition.name,
                        id: format!("{}00{}", definition.id, short_id()),
                        parent: Some(definition.id),
                    });
                }
            }

            Mutation::RemoveContentType {
                list,
                content_type_id,
            } => {
                let target = self.list_mut(list)?;
                let idx = target
                    .content_types
                    .iter()
                    .position(|ct| &ct.id == content_type_id)
                    .ok_or_else(|| {
                        RepoError::NotFound(format!("content type {} on '{}'", content_type_id, list))
                    })?;
                target.content_types.remove(idx);
            }

            Mutation::AddView { list, view } => {
                let target = self.list_mut(list)?;
                if target.views.iter().any(|v| v.title == view.title) {
                    return Err(RepoError::Conflict(format!(
                        "'{}' already has view '{}'",
                        list, view.title
                    )));
                }
                if view.default_view {
                    for existing in &mut target.views {
                        existing.default_view = false;
                    }
                }
                target.views.push(view.clone());
            }

            Mutation::RemoveView { list, title } => {
                let target = self.list_mut(list)?;
                let idx = target
                    .views
                    .iter()
                    .position(|v| &v.title == title)
                    .ok_or_else(|| RepoError::NotFound(format!("view '{}' on '{}'", title, list)))?;
                target.views.remove(idx);
            }

            Mutation::CopyDocument {
                source,
                destination,
                overwrite,
            } => {
                let original = self
                    .files
                    .get(source)
                    .cloned()
                    .ok_or_else(|| RepoError::NotFound(format!("file {}", source)))?;
                let unique_id = match self.files.get(destination) {
                    Some(_) if !overwrite => {
                        return Err(RepoError::Conflict(format!("{} already exists", destination)))
                    }
                    Some(existing) if existing.doc.checkout == CheckoutState::CheckedOutToOther => {
                        return Err(RepoError::Conflict(format!(
                            "{} is checked out to another user",
                            destination
                        )))
                    }
                    Some(existing) => existing.doc.unique_id.clone(),
                    None => new_guid(),
                };
                let mut copy = original;
                copy.doc.path = destination.clone();
                copy.doc.unique_id = unique_id;
                copy.doc.checkout = CheckoutState::NotCheckedOut;
                self.files.insert(destination.clone(), copy);
            }

            Mutation::UploadFile {
                folder,
                name,
                content,
                overwrite,
            } => {
                let path = folder.join(name).map_err(|e| RepoError::ApiError {
                    status: 400,
                    message: e.to_string(),
                })?;
                let previous = self.files.get(&path).cloned();
                if let Some(existing) = &previous {
                    if !overwrite {
                        return Err(RepoError::Conflict(format!("{} already exists", path)));
                    }
                    if existing.doc.checkout == CheckoutState::CheckedOutToOther {
                        return Err(RepoError::Conflict(format!(
                            "{} is checked out to another user",
                            path
                        )));
                    }
                }
                let mut file = previous.unwrap_or_else(|| MockFile {
                    doc: DocumentRef {
                        path: path.clone(),
                        unique_id: new_guid(),
                        checkout: CheckoutState::NotCheckedOut,
                        level: PublishLevel::Draft,
                        moderation: ModerationStatus::Other,
                    },
                    content: Vec::new(),
                    fields: BTreeMap::new(),
                    layout: None,
                });
                file.content = content.clone();
                file.doc.checkout = CheckoutState::CheckedOutToUser;
                file.doc.level = PublishLevel::Draft;
                file.doc.moderation = ModerationStatus::Other;
                self.files.insert(path, file);
            }

            Mutation::UpdateItemFields { path, fields } => {
                let file = self.file_mut(path)?;
                if file.doc.checkout == CheckoutState::CheckedOutToOther {
                    return Err(RepoError::Conflict(format!(
                        "{} is checked out to another user",
                        path
                    )));
                }
                file.fields
                    .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }

            Mutation::CheckOut { path } => {
                let file = self.file_mut(path)?;
                if file.doc.checkout.is_checked_out() {
                    return Err(RepoError::Conflict(format!("{} is already checked out", path)));
                }
                file.doc.checkout = CheckoutState::CheckedOutToUser;
            }

            Mutation::UndoCheckOut { path } => {
                let file = self.file_mut(path)?;
                if !file.doc.checkout.is_checked_out() {
                    return Err(RepoError::Conflict(format!("{} is not checked out", path)));
                }
                file.doc.checkout = CheckoutState::NotCheckedOut;
            }

            Mutation::CheckIn { path, kind, .. } => {
                let moderated = self.moderated(path);
                let file = self.file_mut(path)?;
                if file.doc.checkout != CheckoutState::CheckedOutToUser {
                    return Err(RepoError::Conflict(format!(
                        "{} is not checked out to the current user",
                        path
                    )));
                }
                file.doc.checkout = CheckoutState::NotCheckedOut;
                match kind {
                    CheckInKind::Major | CheckInKind::Overwrite => {
                        file.doc.level = PublishLevel::Published;
                        file.doc.moderation = pending_if(moderated);
                    }
                    CheckInKind::Minor => {
                        file.doc.level = PublishLevel::Draft;
                    }
                }
            }

            Mutation::Publish { path, .. } => {
                let moderated = self.moderated(path);
                let file = self.file_mut(path)?;
                if file.doc.checkout.is_checked_out() {
                    return Err(RepoError::Conflict(format!("{} is checked out", path)));
                }
                if file.doc.level != PublishLevel::Draft {
                    return Err(RepoError::Conflict(format!("{} is already published", path)));
                }
                file.doc.level = PublishLevel::Published;
                file.doc.moderation = pending_if(moderated);
            }

            Mutation::Approve { path, .. } => {
                let file = self.file_mut(path)?;
                if file.doc.moderation != ModerationStatus::Pending {
                    return Err(RepoError::Conflict(format!(
                        "{} is not pending approval",
                        path
                    )));
                }
                file.doc.moderation = ModerationStatus::Approved;
            }

            Mutation::SetSiteProperty { key, value } => {
                self.properties.insert(key.clone(), value.clone());
            }

            Mutation::UpdateSite {
                master_url,
                custom_master_url,
            } => {
                if let Some(url) = master_url {
                    self.site.master_url = url.clone();
                }
                if let Some(url) = custom_master_url {
                    self.site.custom_master_url = url.clone();
                }
            }

            Mutation::SetPageLayout { page, layout } => {
                let file = self.file_mut(page)?;
                if file.doc.checkout != CheckoutState::CheckedOutToUser {
                    return Err(RepoError::Conflict(format!(
                        "{} must be checked out before editing",
                        page
                    )));
                }
                file.layout = Some(layout.clone());
            }
        }

        Ok(())
    }
}

fn pending_if(moderated: bool) -> ModerationStatus {
    if moderated {
        ModerationStatus::Pending
    } else {
        ModerationStatus::Approved
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}

#[async_trait]
impl RepositoryClient for MockRepository {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn lists(&self) -> Result<Vec<ListSummary>, RepoError> {
        self.read("lists", "", |s| {
            Ok(s.lists.iter().map(MockList::summary).collect())
        })
    }

    async fn list_schema(&self, title: &str) -> Result<ListSchema, RepoError> {
        self.read("list_schema", title, |s| s.list(title).map(MockList::schema))
    }

    async fn content_types(&self, list: &str) -> Result<Vec<ContentTypeRef>, RepoError> {
        self.read("content_types", list, |s| {
            s.list(list).map(|l| l.content_types.clone())
        })
    }

    async fn views(&self, list: &str) -> Result<Vec<ViewDef>, RepoError> {
        self.read("views", list, |s| s.list(list).map(|l| l.views.clone()))
    }

    async fn documents(&self, folder: &ServerPath) -> Result<Vec<DocumentRef>, RepoError> {
        self.read("documents", folder.as_str(), |s| {
            Ok(s.files
                .values()
                .filter(|f| f.doc.path.parent().as_ref() == Some(folder))
                .map(|f| f.doc.clone())
                .collect())
        })
    }

    async fn document(&self, path: &ServerPath) -> Result<Option<DocumentRef>, RepoError> {
        self.read("document", path.as_str(), |s| {
            Ok(s.files.get(path).map(|f| f.doc.clone()))
        })
    }

    async fn site(&self) -> Result<SiteInfo, RepoError> {
        self.read("site", "", |s| Ok(s.site.clone()))
    }

    async fn site_content_types(&self) -> Result<Vec<ContentTypeRef>, RepoError> {
        self.read("site_content_types", "", |s| Ok(s.site_content_types.clone()))
    }

    async fn gallery(&self) -> Result<Gallery, RepoError> {
        self.read("gallery", "", |s| Ok(s.gallery.clone()))
    }

    async fn pages(&self, library: &str) -> Result<Vec<PageRef>, RepoError> {
        self.read("pages", library, |s| {
            let list = s.list(library)?;
            Ok(s.files
                .values()
                .filter(|f| f.doc.path != list.root && f.doc.path.starts_with(&list.root))
                .map(|f| PageRef {
                    path: f.doc.path.clone(),
                    layout: f.layout.clone(),
                })
                .collect())
        })
    }

    async fn site_property(&self, key: &str) -> Result<Option<String>, RepoError> {
        self.read("site_property", key, |s| Ok(s.properties.get(key).cloned()))
    }

    async fn execute(&self, batch: Batch) -> Result<(), RepoError> {
        let mutations = batch.into_mutations();
        let mut inner = self.inner.lock().unwrap();

        let injected = match &inner.fail_on {
            Some(FailOn::Mutation { name, error }) if mutations.iter().any(|m| m.name() == *name) => {
                Some(error.clone())
            }
            _ => None,
        };

        let outcome = match injected {
            Some(error) => Err(error),
            None => {
                let mut staged = inner.state.clone();
                mutations
                    .iter()
                    .try_for_each(|m| staged.apply(m))
                    .map(|()| staged)
            }
        };

        let committed = outcome.is_ok();
        inner.operations.push(MockOperation::Execute {
            mutations,
            committed,
        });

        match outcome {
            Ok(staged) => {
                inner.state = staged;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ServerPath {
        ServerPath::new(s).unwrap()
    }

    #[tokio::test]
    async fn failed_batch_leaves_state_untouched() {
        let repo = MockRepository::new().with_file(MockFile::new("/Docs/a.txt"));

        let batch = Batch::new()
            .with(Mutation::CheckOut {
                path: path("/Docs/a.txt"),
            })
            .with(Mutation::CheckOut {
                path: path("/Docs/missing.txt"),
            });
        let result = repo.execute(batch).await;

        assert!(matches!(result, Err(RepoError::NotFound(_))));
        assert_eq!(
            repo.file("/Docs/a.txt").unwrap().doc.checkout,
            CheckoutState::NotCheckedOut
        );
        assert!(repo.mutations().is_empty());
        assert_eq!(repo.execute_count(), 1);
    }

    #[tokio::test]
    async fn double_checkout_conflicts() {
        let repo = MockRepository::new().with_file(
            MockFile::new("/Docs/a.txt").checked_out(CheckoutState::CheckedOutToOther),
        );
        let result = repo
            .execute(Batch::single(Mutation::CheckOut {
                path: path("/Docs/a.txt"),
            }))
            .await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn check_in_requires_own_checkout() {
        let repo = MockRepository::new().with_file(
            MockFile::new("/Docs/a.txt").checked_out(CheckoutState::CheckedOutToOther),
        );
        let result = repo
            .execute(Batch::single(Mutation::CheckIn {
                path: path("/Docs/a.txt"),
                comment: "c".into(),
                kind: CheckInKind::Major,
            }))
            .await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn upload_leaves_file_checked_out_draft() {
        let repo = MockRepository::new();
        repo.execute(Batch::single(Mutation::UploadFile {
            folder: path(GALLERY_ROOT),
            name: "new.master".into(),
            content: b"<html/>".to_vec(),
            overwrite: true,
        }))
        .await
        .unwrap();

        let file = repo.file("/_catalogs/masterpage/new.master").unwrap();
        assert_eq!(file.doc.checkout, CheckoutState::CheckedOutToUser);
        assert_eq!(file.doc.level, PublishLevel::Draft);
        assert_eq!(file.content, b"<html/>");
    }

    #[tokio::test]
    async fn major_check_in_in_moderated_gallery_is_pending() {
        let repo = MockRepository::new().with_file(
            MockFile::new("/_catalogs/masterpage/a.master")
                .checked_out(CheckoutState::CheckedOutToUser)
                .level(PublishLevel::Draft),
        );
        repo.execute(Batch::single(Mutation::CheckIn {
            path: path("/_catalogs/masterpage/a.master"),
            comment: "c".into(),
            kind: CheckInKind::Major,
        }))
        .await
        .unwrap();

        let doc = repo.file("/_catalogs/masterpage/a.master").unwrap().doc;
        assert_eq!(doc.level, PublishLevel::Published);
        assert_eq!(doc.moderation, ModerationStatus::Pending);
    }

    #[tokio::test]
    async fn created_list_has_implicit_schema() {
        let repo = MockRepository::new();
        repo.execute(Batch::single(Mutation::CreateList {
            title: "Contoso Library".into(),
            template: 101,
        }))
        .await
        .unwrap();

        let list = repo.list("Contoso Library").unwrap();
        assert_eq!(list.root.as_str(), "/ContosoLibrary");
        assert_eq!(list.content_types.len(), 1);
        assert_eq!(list.content_types[0].parent.as_deref(), Some(DOCUMENT_CONTENT_TYPE));
        assert_eq!(list.views[0].title, DEFAULT_VIEW_TITLE);
    }

    #[tokio::test]
    async fn add_content_type_uses_site_definition() {
        let repo = MockRepository::new().with_list(
            MockList::new("Docs", 101, "/Docs").with_content_type(ContentTypeRef {
                name: "Document".into(),
                id: "0x010100AA".into(),
                parent: Some(DOCUMENT_CONTENT_TYPE.into()),
            }),
        );
        repo.execute(Batch::single(Mutation::AddContentType {
            list: "Docs".into(),
            content_type_id: ARTICLE_PAGE_CONTENT_TYPE.into(),
        }))
        .await
        .unwrap();

        let list = repo.list("Docs").unwrap();
        let added = list.content_types.last().unwrap();
        assert_eq!(added.name, "Article Page");
        assert_eq!(added.parent.as_deref(), Some(ARTICLE_PAGE_CONTENT_TYPE));
        assert!(added.id.starts_with(ARTICLE_PAGE_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn documents_lists_direct_children_only() {
        let repo = MockRepository::new()
            .with_file(MockFile::new("/a/b/doc.txt"))
            .with_file(MockFile::new("/a/b/x/nested.txt"));

        let docs = repo.documents(&path("/a/b")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path.as_str(), "/a/b/doc.txt");
    }

    #[tokio::test]
    async fn delete_list_removes_its_files() {
        let repo = MockRepository::new()
            .with_list(MockList::new("Docs", 101, "/Docs"))
            .with_file(MockFile::new("/Docs/a.txt"));

        repo.execute(Batch::single(Mutation::DeleteList {
            title: "Docs".into(),
        }))
        .await
        .unwrap();

        assert!(repo.list("Docs").is_none());
        assert!(repo.file("/Docs/a.txt").is_none());
    }

    #[tokio::test]
    async fn injected_read_failure() {
        let repo = MockRepository::new().fail_on(FailOn::Read {
            method: "site",
            error: RepoError::NetworkError("down".into()),
        });
        assert!(matches!(
            repo.site().await,
            Err(RepoError::NetworkError(_))
        ));
        repo.clear_fail_on();
        assert!(repo.site().await.is_ok());
    }

    #[tokio::test]
    async fn injected_mutation_failure_is_recorded_uncommitted() {
        let repo = MockRepository::new()
            .with_file(MockFile::new("/Docs/a.txt"))
            .fail_on(FailOn::Mutation {
                name: "check_out",
                error: RepoError::ApiError {
                    status: 500,
                    message: "boom".into(),
                },
            });

        let result = repo
            .execute(Batch::single(Mutation::CheckOut {
                path: path("/Docs/a.txt"),
            }))
            .await;
        assert!(result.is_err());
        assert!(matches!(
            repo.operations().last(),
            Some(MockOperation::Execute {
                committed: false,
                ..
            })
        ));
    }

    #[test]
    fn client_name() {
        assert_eq!(MockRepository::new().name(), "mock");
    }
}
