//! engine::lists
//!
//! Replace every list built from a deprecated template.
//!
//! # Pipeline
//!
//! For each list created from the deprecated template:
//!
//! 1. Delete a replacement left behind by an earlier run (a missing one is fine)
//! 2. Create the replacement and copy the source's versioning settings
//! 3. Reconcile content types, then views
//! 4. Copy the source's top-level documents into the replacement
//!
//! The source list is only read, never changed. A list already holding a
//! replacement title counts as a leftover only when it was built from the
//! replacement template and is not itself a deprecated list; anything else
//! stops the run before the first mutation.

use tracing::{debug, info};

use super::migrate::{migrate_documents, MigrationReport};
use super::reconcile::{reconcile_content_types, reconcile_views, ReconcileReport};
use super::EngineError;
use crate::core::config::{
    Config, DEFAULT_DEPRECATED_TEMPLATE, DEFAULT_REPLACEMENT_SUFFIX, DEFAULT_REPLACEMENT_TEMPLATE,
};
use crate::remote::{ignore_not_found, Batch, ListSummary, Mutation, RepositoryClient};

/// Parameters of a list replacement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListJob {
    pub deprecated_template: u32,
    pub replacement_template: u32,
    /// Appended to a source title to name its replacement
    pub replacement_suffix: String,
    /// Delete leftovers from an earlier run first
    pub recreate: bool,
}

impl Default for ListJob {
    fn default() -> Self {
        Self {
            deprecated_template: DEFAULT_DEPRECATED_TEMPLATE,
            replacement_template: DEFAULT_REPLACEMENT_TEMPLATE,
            replacement_suffix: DEFAULT_REPLACEMENT_SUFFIX.to_string(),
            recreate: true,
        }
    }
}

impl ListJob {
    pub fn from_config(config: &Config) -> Self {
        Self {
            deprecated_template: config.deprecated_template(),
            replacement_template: config.replacement_template(),
            replacement_suffix: config.replacement_suffix().to_string(),
            recreate: config.recreate(),
        }
    }

    /// Title of the list replacing `source`.
    pub fn replacement_title(&self, source: &str) -> String {
        format!("{}{}", source, self.replacement_suffix)
    }
}

/// Outcome of replacing one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReplacement {
    pub source: String,
    pub replacement: String,
    /// Whether a leftover replacement was deleted first
    pub recreated: bool,
    pub content_types: ReconcileReport,
    pub views: ReconcileReport,
    pub migration: MigrationReport,
}

/// Outcome of a list replacement run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListReport {
    pub replaced: Vec<ListReplacement>,
}

/// Replace every list built from the job's deprecated template.
pub async fn replace_lists(
    client: &dyn RepositoryClient,
    job: &ListJob,
) -> Result<ListReport, EngineError> {
    let lists = client.lists().await?;
    let candidates: Vec<&str> = lists
        .iter()
        .filter(|list| list.template == job.deprecated_template)
        .map(|list| list.title.as_str())
        .collect();

    if candidates.is_empty() {
        info!(template = job.deprecated_template, "no lists use the deprecated template");
    }

    for title in &candidates {
        check_replacement_title(&lists, title, job)?;
    }

    let mut report = ListReport::default();
    for title in &candidates {
        report.replaced.push(replace_checked(client, title, job).await?);
    }

    Ok(report)
}

/// Replace a single list.
pub async fn replace_list(
    client: &dyn RepositoryClient,
    title: &str,
    job: &ListJob,
) -> Result<ListReplacement, EngineError> {
    let lists = client.lists().await?;
    check_replacement_title(&lists, title, job)?;
    replace_checked(client, title, job).await
}

/// Fail if the replacement title belongs to a list that is not a leftover.
fn check_replacement_title(
    lists: &[ListSummary],
    title: &str,
    job: &ListJob,
) -> Result<(), EngineError> {
    let replacement = job.replacement_title(title);
    match lists.iter().find(|list| list.title == replacement) {
        Some(existing)
            if existing.template == job.deprecated_template
                || existing.template != job.replacement_template =>
        {
            Err(EngineError::ReplacementTitleTaken {
                list: title.to_string(),
                replacement,
                template: existing.template,
            })
        }
        _ => Ok(()),
    }
}

async fn replace_checked(
    client: &dyn RepositoryClient,
    title: &str,
    job: &ListJob,
) -> Result<ListReplacement, EngineError> {
    let source = client.list_schema(title).await?;
    let replacement = job.replacement_title(title);
    info!(source = title, replacement = %replacement, "replacing list");

    let recreated = if job.recreate {
        let deleted = ignore_not_found(
            client
                .execute(Batch::single(Mutation::DeleteList {
                    title: replacement.clone(),
                }))
                .await,
        )?;
        if deleted {
            info!(list = %replacement, "deleted leftover replacement");
        } else {
            debug!(list = %replacement, "no leftover replacement");
        }
        deleted
    } else {
        false
    };

    client
        .execute(
            Batch::new()
                .with(Mutation::CreateList {
                    title: replacement.clone(),
                    template: job.replacement_template,
                })
                .with(Mutation::UpdateListSettings {
                    list: replacement.clone(),
                    settings: source.settings,
                }),
        )
        .await?;

    let target = client.list_schema(&replacement).await?;

    let content_types = reconcile_content_types(client, &source, &replacement).await?;
    let views = reconcile_views(client, &source, &replacement).await?;
    let migration = migrate_documents(client, &source.root, &target.root).await?;

    Ok(ListReplacement {
        source: title.to_string(),
        replacement,
        recreated,
        content_types,
        views,
        migration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ViewKind;
    use crate::remote::mock::{
        FailOn, MockFile, MockList, MockRepository, ARTICLE_PAGE_CONTENT_TYPE,
        DOCUMENT_CONTENT_TYPE,
    };
    use crate::remote::{ContentTypeRef, ListSettings, RepoError, ViewDef};

    fn legacy_list() -> MockList {
        MockList::new("Contoso", 10003, "/Contoso")
            .with_settings(ListSettings {
                enable_versioning: true,
                enable_minor_versions: true,
                ..Default::default()
            })
            .with_content_type(ContentTypeRef {
                name: "Document".into(),
                id: format!("{}0011", DOCUMENT_CONTENT_TYPE),
                parent: Some(DOCUMENT_CONTENT_TYPE.into()),
            })
            .with_content_type(ContentTypeRef {
                name: "Article Page".into(),
                id: format!("{}0022", ARTICLE_PAGE_CONTENT_TYPE),
                parent: Some(ARTICLE_PAGE_CONTENT_TYPE.into()),
            })
            .with_view(ViewDef {
                title: "By Author".into(),
                paged: true,
                personal: false,
                query: "<OrderBy><FieldRef Name=\"Author\"/></OrderBy>".into(),
                row_limit: 50,
                default_view: true,
                fields: vec!["LinkFilename".into(), "Author".into()],
                kind: ViewKind::Html,
            })
    }

    #[tokio::test]
    async fn replaces_only_deprecated_lists() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .with_list(MockList::new("Other", 101, "/Other"))
            .with_file(MockFile::new("/Contoso/a.docx"));

        let report = replace_lists(&repo, &ListJob::default()).await.unwrap();

        assert_eq!(report.replaced.len(), 1);
        assert_eq!(report.replaced[0].replacement, "ContosoApp");
        assert!(repo.list("OtherApp").is_none());
    }

    #[tokio::test]
    async fn replacement_mirrors_source() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .with_file(MockFile::new("/Contoso/a.docx").with_content("a"))
            .with_file(MockFile::new("/Contoso/sub/b.docx"));

        replace_list(&repo, "Contoso", &ListJob::default())
            .await
            .unwrap();

        let target = repo.list("ContosoApp").unwrap();
        let source = repo.list("Contoso").unwrap();
        assert_eq!(target.template, 101);
        assert_eq!(target.settings, source.settings);
        assert!(target.content_types_enabled);

        let names: Vec<_> = target.content_types.iter().map(|ct| ct.name.as_str()).collect();
        assert_eq!(names, vec!["Document", "Article Page"]);

        let views: Vec<_> = target.views.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(views, vec!["By Author"]);

        assert_eq!(repo.file("/ContosoApp/a.docx").unwrap().content, b"a");
        assert!(repo.file("/ContosoApp/sub/b.docx").is_none());
    }

    #[tokio::test]
    async fn leftover_replacement_is_deleted() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .with_list(MockList::new("ContosoApp", 101, "/ContosoApp"))
            .with_file(MockFile::new("/ContosoApp/stale.docx"));

        let outcome = replace_list(&repo, "Contoso", &ListJob::default())
            .await
            .unwrap();

        assert!(outcome.recreated);
        assert!(repo.file("/ContosoApp/stale.docx").is_none());
    }

    #[tokio::test]
    async fn missing_leftover_is_not_an_error() {
        let repo = MockRepository::new().with_list(legacy_list());

        let outcome = replace_list(&repo, "Contoso", &ListJob::default())
            .await
            .unwrap();

        assert!(!outcome.recreated);
        assert!(repo.list("ContosoApp").is_some());
    }

    #[tokio::test]
    async fn other_delete_errors_propagate() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .fail_on(FailOn::Mutation {
                name: "delete_list",
                error: RepoError::AuthFailed("no rights".into()),
            });

        let err = replace_list(&repo, "Contoso", &ListJob::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Repo(RepoError::AuthFailed(_))));
        assert!(repo.list("ContosoApp").is_none());
    }

    #[tokio::test]
    async fn deprecated_list_holding_replacement_title_stops_run() {
        let repo = MockRepository::new()
            .with_list(MockList::new("Docs", 10003, "/Docs"))
            .with_list(MockList::new("DocsApp", 10003, "/DocsApp"))
            .with_file(MockFile::new("/Docs/a.docx"))
            .with_file(MockFile::new("/DocsApp/precious.docx"));

        let err = replace_lists(&repo, &ListJob::default()).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::ReplacementTitleTaken { ref replacement, template: 10003, .. }
                if replacement == "DocsApp"
        ));
        assert_eq!(repo.execute_count(), 0);
        assert!(repo.file("/DocsApp/precious.docx").is_some());
    }

    #[tokio::test]
    async fn unrelated_list_holding_replacement_title_is_kept() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .with_list(MockList::new("ContosoApp", 850, "/ContosoApp"))
            .with_file(MockFile::new("/ContosoApp/home.aspx"));

        let err = replace_list(&repo, "Contoso", &ListJob::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ReplacementTitleTaken { template: 850, .. }));
        assert_eq!(repo.execute_count(), 0);
        assert!(repo.file("/ContosoApp/home.aspx").is_some());
    }

    #[tokio::test]
    async fn rerun_converges() {
        let repo = MockRepository::new()
            .with_list(legacy_list())
            .with_file(MockFile::new("/Contoso/a.docx"));
        let job = ListJob::default();

        replace_lists(&repo, &job).await.unwrap();
        let report = replace_lists(&repo, &job).await.unwrap();

        assert_eq!(report.replaced.len(), 1);
        assert!(report.replaced[0].recreated);
        assert!(repo.file("/ContosoApp/a.docx").is_some());
    }

    #[test]
    fn replacement_title_uses_suffix() {
        let job = ListJob {
            replacement_suffix: "V2".into(),
            ..Default::default()
        };
        assert_eq!(job.replacement_title("Docs"), "DocsV2");
    }

    #[test]
    fn job_from_default_config() {
        assert_eq!(ListJob::from_config(&Config::default()), ListJob::default());
    }
}
