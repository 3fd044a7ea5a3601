//! End-to-end branding replacement against the in-memory repository.
//!
//! These tests drive `replace_branding` the way the CLI does and then
//! inspect the repository state a site owner would see.

use std::fs;

use tempfile::TempDir;

use sitegraft::core::layouts::{
    LayoutEntry, LayoutRegistry, AVAILABLE_LAYOUTS_PROPERTY, DEFAULT_LAYOUT_PROPERTY,
};
use sitegraft::core::settings::Settings;
use sitegraft::core::types::{CheckoutState, ModerationStatus, PublishLevel};
use sitegraft::engine::branding::{replace_branding, BrandingJob};
use sitegraft::engine::{EngineError, WorkflowStep};
use sitegraft::remote::mock::{FailOn, MockFile, MockList, MockRepository, GALLERY_ROOT};
use sitegraft::remote::{ListSettings, Mutation, RepoError};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A settings document plus its asset files on disk.
struct Assets {
    dir: TempDir,
}

impl Assets {
    fn new(xml: &str, files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        fs::write(dir.path().join("settings.xml"), xml).unwrap();
        Self { dir }
    }

    fn settings(&self) -> Settings {
        Settings::load(&self.dir.path().join("settings.xml")).unwrap()
    }
}

fn full_branding() -> Assets {
    Assets::new(
        r#"<branding>
             <masterPages>
               <masterPage file="new.master" replaces="seattle.master" />
             </masterPages>
             <pageLayouts>
               <pageLayout file="ContosoArticle.aspx" replaces="ArticleLeft.aspx"
                           title="Contoso Article" associatedContentTypeName="Article Page"
                           defaultLayout="true" />
             </pageLayouts>
           </branding>"#,
        &[
            ("new.master", "<html>new</html>"),
            ("ContosoArticle.aspx", "<layout>contoso</layout>"),
        ],
    )
}

fn old_layout() -> String {
    format!("{}/ArticleLeft.aspx", GALLERY_ROOT)
}

/// A site with a pages library and a registry that offers the old layout.
fn publishing_site() -> MockRepository {
    let registry = format!(
        r#"<pagelayouts><layout guid="11111111-1111-1111-1111-111111111111" url="{}" /><layout guid="22222222-2222-2222-2222-222222222222" url="{}/BlankWebPart.aspx" /></pagelayouts>"#,
        old_layout(),
        GALLERY_ROOT
    );

    MockRepository::new()
        .with_list(MockList::new("Pages", 850, "/Pages").with_settings(ListSettings {
            enable_versioning: true,
            enable_moderation: true,
            enable_minor_versions: true,
            ..Default::default()
        }))
        .with_file(MockFile::new("/Pages/home.aspx").with_layout(
            format!("http://w15-sp{}", old_layout()),
            "Article Left",
        ))
        .with_file(MockFile::new("/Pages/about.aspx").with_layout(
            format!("http://w15-sp{}/BlankWebPart.aspx", GALLERY_ROOT),
            "Blank",
        ))
        .with_property(AVAILABLE_LAYOUTS_PROPERTY, registry)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn new_master_replaces_old_master() {
    let assets = full_branding();
    let repo = publishing_site();

    let report = replace_branding(&repo, &assets.settings(), &BrandingJob::default())
        .await
        .unwrap();

    let uploaded = format!("{}/new.master", GALLERY_ROOT);
    let site = repo.site_info();
    assert!(site.master_url.ends_with("/new.master"));
    assert!(site.custom_master_url.ends_with("/new.master"));
    assert!(report.site_updated);

    let file = repo.file(&uploaded).unwrap();
    assert_eq!(file.content, b"<html>new</html>");
    assert_eq!(file.doc.checkout, CheckoutState::NotCheckedOut);
    assert_eq!(file.doc.level, PublishLevel::Published);
    assert_eq!(file.doc.moderation, ModerationStatus::Approved);
}

#[tokio::test]
async fn layout_registry_and_pages_follow_new_layout() {
    let assets = full_branding();
    let repo = publishing_site();

    let report = replace_branding(&repo, &assets.settings(), &BrandingJob::default())
        .await
        .unwrap();

    let new_layout = format!("{}/ContosoArticle.aspx", GALLERY_ROOT);
    let layout_file = repo.file(&new_layout).unwrap();
    assert_eq!(layout_file.doc.moderation, ModerationStatus::Approved);

    // Available layouts: the old entry now points at the upload, the other
    // entry is untouched.
    let registry =
        LayoutRegistry::parse(&repo.property(AVAILABLE_LAYOUTS_PROPERTY).unwrap()).unwrap();
    assert_eq!(registry.entries.len(), 2);
    assert_eq!(registry.entries[0].url, new_layout);
    assert_eq!(registry.entries[0].guid, layout_file.doc.unique_id);
    assert!(registry.entries[1].url.ends_with("/BlankWebPart.aspx"));

    let default = LayoutEntry::parse(&repo.property(DEFAULT_LAYOUT_PROPERTY).unwrap()).unwrap();
    assert_eq!(default.url, new_layout);

    // Only the page on the replaced layout is rewritten, and it ends up
    // published and approved in its moderated library.
    assert_eq!(report.pages.len(), 1);
    let home = repo.file("/Pages/home.aspx").unwrap();
    let layout = home.layout.unwrap();
    assert!(layout.url.ends_with("/ContosoArticle.aspx"));
    assert!(layout.url.starts_with("http://w15-sp"));
    assert_eq!(layout.description, "Article Left");
    assert_eq!(home.doc.checkout, CheckoutState::NotCheckedOut);
    assert_eq!(home.doc.level, PublishLevel::Published);
    assert_eq!(home.doc.moderation, ModerationStatus::Approved);

    let about = repo.file("/Pages/about.aspx").unwrap();
    assert!(about.layout.unwrap().url.ends_with("/BlankWebPart.aspx"));
}

#[tokio::test]
async fn second_run_reuses_existing_upload() {
    let assets = full_branding();
    let repo = publishing_site();
    let job = BrandingJob::default();

    replace_branding(&repo, &assets.settings(), &job).await.unwrap();
    let first_id = repo
        .file(&format!("{}/new.master", GALLERY_ROOT))
        .unwrap()
        .doc
        .unique_id;

    let report = replace_branding(&repo, &assets.settings(), &job).await.unwrap();

    let file = repo.file(&format!("{}/new.master", GALLERY_ROOT)).unwrap();
    assert_eq!(file.doc.unique_id, first_id);
    assert_eq!(file.doc.level, PublishLevel::Published);
    // The site already points at the upload, so nothing references the old file.
    assert!(!report.site_updated);
    assert!(report.pages.is_empty());
}

#[tokio::test]
async fn leftover_checkout_is_taken_over() {
    let assets = full_branding();
    let uploaded = format!("{}/new.master", GALLERY_ROOT);
    let repo = publishing_site().with_file(
        MockFile::new(&uploaded)
            .checked_out(CheckoutState::CheckedOutToOther)
            .level(PublishLevel::Draft)
            .moderation(ModerationStatus::Other),
    );

    replace_branding(&repo, &assets.settings(), &BrandingJob::default())
        .await
        .unwrap();

    let on_upload = |m: &Mutation| match m {
        Mutation::UndoCheckOut { path } | Mutation::CheckOut { path } => {
            path.as_str() == uploaded
        }
        _ => false,
    };
    let names: Vec<_> = repo
        .mutations()
        .into_iter()
        .filter(on_upload)
        .map(|m| m.name())
        .collect();
    assert_eq!(names, vec!["undo_check_out", "check_out"]);

    let file = repo.file(&uploaded).unwrap();
    assert_eq!(file.doc.checkout, CheckoutState::NotCheckedOut);
    assert_eq!(file.doc.level, PublishLevel::Published);
    assert_eq!(file.doc.moderation, ModerationStatus::Approved);
}

#[tokio::test]
async fn failed_approval_is_reported_with_its_step() {
    let assets = full_branding();
    let repo = publishing_site().fail_on(FailOn::Mutation {
        name: "approve",
        error: RepoError::AuthFailed("approver rights required".into()),
    });

    let err = replace_branding(&repo, &assets.settings(), &BrandingJob::default())
        .await
        .unwrap_err();

    match err {
        EngineError::Workflow { step, path, .. } => {
            assert_eq!(step, WorkflowStep::Approve);
            assert!(path.as_str().ends_with("/new.master"));
        }
        other => panic!("expected workflow error, got {other:?}"),
    }
    let file = repo.file(&format!("{}/new.master", GALLERY_ROOT)).unwrap();
    assert_eq!(file.doc.moderation, ModerationStatus::Pending);
}
