//! engine::branding
//!
//! Replace master pages and page layouts across a site.
//!
//! # Pipeline
//!
//! 1. Resolve the gallery's master page and page layout content types
//! 2. For each master page: check out, upload, stamp fields, finalize,
//!    repoint the site's master page references
//! 3. For each page layout: check out, upload, stamp fields, finalize,
//!    update the available layouts (and the default layout if flagged)
//! 4. Repoint every page using a replaced layout
//!
//! Assets are processed in settings order, master pages first.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::rewrite::{
    rewrite_master_references, rewrite_page_layouts, set_default_layout, update_available_layouts,
};
use super::workflow::DocumentWorkflow;
use super::EngineError;
use crate::core::config::{
    Config, DEFAULT_COMMENT, DEFAULT_MASTER_PAGE_CONTENT_TYPE, DEFAULT_MASTER_PAGE_DESCRIPTION,
    DEFAULT_PAGES_LIBRARY, DEFAULT_PAGE_LAYOUT_CONTENT_TYPE, DEFAULT_UI_VERSION,
};
use crate::core::settings::{AssetReplacement, Settings};
use crate::core::types::ServerPath;
use crate::remote::{
    Batch, ContentTypeRef, DocumentRef, Gallery, Mutation, RepoError, RepositoryClient,
};

/// Item field holding a document's content type id.
pub const FIELD_CONTENT_TYPE_ID: &str = "ContentTypeId";
pub const FIELD_UI_VERSION: &str = "UIVersion";
pub const FIELD_MASTER_PAGE_DESCRIPTION: &str = "MasterPageDescription";
pub const FIELD_TITLE: &str = "Title";
/// Item field tying a page layout to the content type of its pages.
pub const FIELD_ASSOCIATED_CONTENT_TYPE: &str = "PublishingAssociatedContentType";

/// Parameters of a branding replacement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingJob {
    pub comment: String,
    pub pages_library: String,
    /// Id prefix identifying the gallery's master page content type
    pub master_page_content_type: String,
    /// Id prefix identifying the gallery's page layout content type
    pub page_layout_content_type: String,
    pub ui_version: String,
    pub master_page_description: String,
}

impl Default for BrandingJob {
    fn default() -> Self {
        Self {
            comment: DEFAULT_COMMENT.to_string(),
            pages_library: DEFAULT_PAGES_LIBRARY.to_string(),
            master_page_content_type: DEFAULT_MASTER_PAGE_CONTENT_TYPE.to_string(),
            page_layout_content_type: DEFAULT_PAGE_LAYOUT_CONTENT_TYPE.to_string(),
            ui_version: DEFAULT_UI_VERSION.to_string(),
            master_page_description: DEFAULT_MASTER_PAGE_DESCRIPTION.to_string(),
        }
    }
}

impl BrandingJob {
    pub fn from_config(config: &Config) -> Self {
        Self {
            comment: config.comment().to_string(),
            pages_library: config.pages_library().to_string(),
            master_page_content_type: config.master_page_content_type().to_string(),
            page_layout_content_type: config.page_layout_content_type().to_string(),
            ui_version: config.ui_version().to_string(),
            master_page_description: config.master_page_description().to_string(),
        }
    }
}

/// What a branding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandingReport {
    /// Uploaded master pages.
    pub master_pages: Vec<ServerPath>,
    /// Uploaded page layouts.
    pub page_layouts: Vec<ServerPath>,
    /// Whether any site master page reference changed.
    pub site_updated: bool,
    /// Pages repointed at a new layout.
    pub pages: Vec<ServerPath>,
}

/// Run a branding replacement.
pub async fn replace_branding(
    client: &dyn RepositoryClient,
    settings: &Settings,
    job: &BrandingJob,
) -> Result<BrandingReport, EngineError> {
    let workflow = DocumentWorkflow::new(client, &job.comment);
    let mut report = BrandingReport::default();

    if settings.is_empty() {
        info!("settings declare no assets, nothing to do");
        return Ok(report);
    }

    let gallery = client.gallery().await?;
    let master_type = gallery_content_type(&gallery, &job.master_page_content_type, "master page")?;
    let layout_type = gallery_content_type(&gallery, &job.page_layout_content_type, "page layout")?;

    for asset in &settings.master_pages {
        let content = read_asset(settings, asset)?;
        let fields = BTreeMap::from([
            (FIELD_CONTENT_TYPE_ID.to_string(), master_type.id.clone()),
            (FIELD_UI_VERSION.to_string(), job.ui_version.clone()),
            (
                FIELD_MASTER_PAGE_DESCRIPTION.to_string(),
                job.master_page_description.clone(),
            ),
        ]);

        let uploaded = upload_asset(&workflow, &gallery, asset, content, fields).await?;
        report.site_updated |= rewrite_master_references(client, asset, &uploaded.path).await?;
        report.master_pages.push(uploaded.path);
    }

    if !settings.page_layouts.is_empty() {
        let site_types = client.site_content_types().await?;

        let mut uploaded_layouts = Vec::with_capacity(settings.page_layouts.len());
        for asset in &settings.page_layouts {
            let associated = associated_content_type(&site_types, asset)?;
            let content = read_asset(settings, asset)?;
            let fields = BTreeMap::from([
                (FIELD_CONTENT_TYPE_ID.to_string(), layout_type.id.clone()),
                (
                    FIELD_TITLE.to_string(),
                    asset
                        .title
                        .clone()
                        .unwrap_or_else(|| asset.file_name().to_string()),
                ),
                (
                    FIELD_ASSOCIATED_CONTENT_TYPE.to_string(),
                    format!(";#{};#{};#", associated.name, associated.id),
                ),
            ]);

            let uploaded = upload_asset(&workflow, &gallery, asset, content, fields).await?;
            update_available_layouts(client, asset, &uploaded).await?;
            if asset.default_layout {
                set_default_layout(client, &uploaded).await?;
            }
            uploaded_layouts.push((asset.clone(), uploaded.path));
        }

        report.pages = rewrite_page_layouts(&workflow, &job.pages_library, &uploaded_layouts).await?;
        report.page_layouts = uploaded_layouts.into_iter().map(|(_, path)| path).collect();
    }

    info!(
        master_pages = report.master_pages.len(),
        page_layouts = report.page_layouts.len(),
        pages = report.pages.len(),
        "branding replaced"
    );
    Ok(report)
}

/// The gallery content type whose id starts with `prefix`.
fn gallery_content_type<'g>(
    gallery: &'g Gallery,
    prefix: &str,
    what: &str,
) -> Result<&'g ContentTypeRef, EngineError> {
    gallery
        .content_types
        .iter()
        .find(|ct| ct.id.starts_with(prefix))
        .ok_or_else(|| {
            EngineError::SchemaMismatch(format!(
                "gallery {} has no {} content type (id prefix {})",
                gallery.root, what, prefix
            ))
        })
}

/// The site content type a page layout's pages use.
fn associated_content_type<'s>(
    site_types: &'s [ContentTypeRef],
    asset: &AssetReplacement,
) -> Result<&'s ContentTypeRef, EngineError> {
    let name = asset.associated_content_type.as_deref().ok_or_else(|| {
        EngineError::SchemaMismatch(format!(
            "page layout '{}' declares no associated content type",
            asset.file
        ))
    })?;

    site_types
        .iter()
        .find(|ct| ct.name == name)
        .ok_or_else(|| {
            EngineError::SchemaMismatch(format!(
                "site has no content type '{}' for page layout '{}'",
                name, asset.file
            ))
        })
}

fn read_asset(settings: &Settings, asset: &AssetReplacement) -> Result<Vec<u8>, EngineError> {
    let path = settings.asset_path(asset);
    std::fs::read(&path).map_err(|source| EngineError::Io { path, source })
}

/// Upload an asset into the gallery and drive it to its final state.
async fn upload_asset(
    workflow: &DocumentWorkflow<'_>,
    gallery: &Gallery,
    asset: &AssetReplacement,
    content: Vec<u8>,
    fields: BTreeMap<String, String>,
) -> Result<DocumentRef, EngineError> {
    let client = workflow.client();
    let path = gallery.root.join(asset.file_name())?;

    info!(kind = %asset.kind, file = %path, replaces = %asset.replaces, "uploading");
    workflow.ensure_checked_out(&path).await?;

    client
        .execute(
            Batch::new()
                .with(Mutation::UploadFile {
                    folder: gallery.root.clone(),
                    name: asset.file_name().to_string(),
                    content,
                    overwrite: true,
                })
                .with(Mutation::UpdateItemFields {
                    path: path.clone(),
                    fields,
                }),
        )
        .await?;

    workflow.finalize(&path).await?;

    let uploaded = client
        .document(&path)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("uploaded file {}", path)))?;
    debug!(file = %path, id = %uploaded.unique_id, "asset in place");
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layouts::{LayoutEntry, DEFAULT_LAYOUT_PROPERTY};
    use crate::remote::mock::{MockRepository, GALLERY_ROOT};
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir, xml: &str, files: &[(&str, &str)]) -> Settings {
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, xml).unwrap();
        Settings::load(&path).unwrap()
    }

    #[tokio::test]
    async fn empty_settings_touch_nothing() {
        let repo = MockRepository::new();
        let report = replace_branding(&repo, &Settings::default(), &BrandingJob::default())
            .await
            .unwrap();

        assert_eq!(report, BrandingReport::default());
        assert!(repo.operations().is_empty());
    }

    #[tokio::test]
    async fn master_page_fields_are_stamped() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<branding><masterPage file="contoso.master" replaces="seattle.master" /></branding>"#,
            &[("contoso.master", "<html>contoso</html>")],
        );
        let repo = MockRepository::new();

        let report = replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap();

        let file = repo
            .file(&format!("{}/contoso.master", GALLERY_ROOT))
            .unwrap();
        assert_eq!(file.content, b"<html>contoso</html>");
        assert!(file.fields[FIELD_CONTENT_TYPE_ID].starts_with("0x010105"));
        assert_eq!(file.fields[FIELD_UI_VERSION], "15");
        assert_eq!(
            file.fields[FIELD_MASTER_PAGE_DESCRIPTION],
            DEFAULT_MASTER_PAGE_DESCRIPTION
        );
        assert!(report.site_updated);
    }

    #[tokio::test]
    async fn missing_gallery_content_type_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<masterPage file="contoso.master" replaces="seattle.master" />"#,
            &[("contoso.master", "x")],
        );
        let repo = MockRepository::new().with_gallery_content_types(vec![]);

        let err = replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch(_)));
        assert_eq!(repo.execute_count(), 0);
    }

    #[tokio::test]
    async fn unknown_associated_content_type_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<pageLayout file="Contoso.aspx" replaces="ArticleLeft.aspx" associatedContentTypeName="Nope" />"#,
            &[("Contoso.aspx", "x")],
        );
        let repo = MockRepository::new();

        let err = replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch(_)));
        assert_eq!(repo.execute_count(), 0);
    }

    #[tokio::test]
    async fn asset_bytes_are_uploaded_verbatim() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<branding><masterPage file="contoso.master" replaces="seattle.master" /></branding>"#,
            &[],
        );
        let bytes = vec![0xef, 0xbb, 0xbf, b'<', 0xe9, b'>'];
        std::fs::write(dir.path().join("contoso.master"), &bytes).unwrap();
        let repo = MockRepository::new();

        replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap();

        let file = repo
            .file(&format!("{}/contoso.master", GALLERY_ROOT))
            .unwrap();
        assert_eq!(file.content, bytes);
    }

    #[tokio::test]
    async fn missing_asset_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<masterPage file="absent.master" replaces="seattle.master" />"#,
            &[],
        );
        let repo = MockRepository::new();

        let err = replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[tokio::test]
    async fn page_layout_fields_and_default_layout() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(
            &dir,
            r#"<pageLayout file="Contoso.aspx" replaces="ArticleLeft.aspx" title="Contoso"
                           associatedContentTypeName="Article Page" defaultLayout="true" />"#,
            &[("Contoso.aspx", "<layout/>")],
        );
        let repo = MockRepository::new().with_list(crate::remote::mock::MockList::new(
            "Pages", 850, "/Pages",
        ));

        let report = replace_branding(&repo, &settings, &BrandingJob::default())
            .await
            .unwrap();

        let path = format!("{}/Contoso.aspx", GALLERY_ROOT);
        let file = repo.file(&path).unwrap();
        assert_eq!(file.fields[FIELD_TITLE], "Contoso");
        assert!(file.fields[FIELD_ASSOCIATED_CONTENT_TYPE].starts_with(";#Article Page;#0x010100C568DB"));
        assert!(file.fields[FIELD_ASSOCIATED_CONTENT_TYPE].ends_with(";#"));

        let default = LayoutEntry::parse(&repo.property(DEFAULT_LAYOUT_PROPERTY).unwrap()).unwrap();
        assert_eq!(default.url, path);
        assert_eq!(default.guid, file.doc.unique_id);
        assert_eq!(report.page_layouts.len(), 1);
    }

    #[test]
    fn job_from_config_uses_accessors() {
        let job = BrandingJob::from_config(&Config::default());
        assert_eq!(job, BrandingJob::default());
    }
}
