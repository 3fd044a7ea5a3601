//! engine::rewrite
//!
//! Point the site and its pages at replacement assets.
//!
//! A reference matches a replacement when it ends with `"/" + replaces`.
//! Site property bags have no concurrency token, so the layout registry is
//! read, modified and written back with the last write winning.

use tracing::{debug, info, warn};

use super::workflow::DocumentWorkflow;
use super::EngineError;
use crate::core::layouts::{
    LayoutEntry, LayoutRegistry, AVAILABLE_LAYOUTS_PROPERTY, DEFAULT_LAYOUT_PROPERTY,
};
use crate::core::paths::{references_file, retarget};
use crate::core::settings::AssetReplacement;
use crate::core::types::ServerPath;
use crate::remote::{Batch, DocumentRef, Mutation, RepositoryClient, UrlField};

/// Point the site's master page references at `uploaded` where they
/// reference the replaced file.
///
/// Returns `true` if the site was updated.
pub async fn rewrite_master_references(
    client: &dyn RepositoryClient,
    replacement: &AssetReplacement,
    uploaded: &ServerPath,
) -> Result<bool, EngineError> {
    let site = client.site().await?;
    let retarget = |current: &str| {
        references_file(current, &replacement.replaces).then(|| uploaded.to_string())
    };

    let master_url = retarget(&site.master_url);
    let custom_master_url = retarget(&site.custom_master_url);

    if master_url.is_none() && custom_master_url.is_none() {
        debug!(replaces = %replacement.replaces, "site does not reference replaced master page");
        return Ok(false);
    }

    info!(
        master = master_url.is_some(),
        custom = custom_master_url.is_some(),
        to = %uploaded,
        "updating site master page references"
    );
    client
        .execute(Batch::single(Mutation::UpdateSite {
            master_url,
            custom_master_url,
        }))
        .await?;

    Ok(true)
}

/// Swap the replaced layout for `uploaded` in the site's available layouts.
///
/// Returns `true` if an entry was rewritten. A missing property is an
/// empty registry, and an unchanged registry is not written back.
pub async fn update_available_layouts(
    client: &dyn RepositoryClient,
    replacement: &AssetReplacement,
    uploaded: &DocumentRef,
) -> Result<bool, EngineError> {
    let current = client
        .site_property(AVAILABLE_LAYOUTS_PROPERTY)
        .await?
        .unwrap_or_default();
    let mut registry = LayoutRegistry::parse(&current)?;

    if !registry.replace(
        &replacement.replaces,
        &uploaded.unique_id,
        uploaded.path.as_str(),
    ) {
        warn!(
            replaces = %replacement.replaces,
            "replaced layout is not among the site's available layouts"
        );
        return Ok(false);
    }

    debug!(replaces = %replacement.replaces, to = %uploaded.path, "updating available layouts");
    client
        .execute(Batch::single(Mutation::SetSiteProperty {
            key: AVAILABLE_LAYOUTS_PROPERTY.to_string(),
            value: registry.to_xml(),
        }))
        .await?;

    Ok(true)
}

/// Make `uploaded` the site's default page layout.
pub async fn set_default_layout(
    client: &dyn RepositoryClient,
    uploaded: &DocumentRef,
) -> Result<(), EngineError> {
    let entry = LayoutEntry::new(uploaded.unique_id.as_str(), uploaded.path.as_str());

    info!(layout = %uploaded.path, "setting default page layout");
    client
        .execute(Batch::single(Mutation::SetSiteProperty {
            key: DEFAULT_LAYOUT_PROPERTY.to_string(),
            value: entry.to_xml(),
        }))
        .await?;

    Ok(())
}

/// Repoint every page of `pages_library` that uses a replaced layout.
///
/// `replacements` pairs each replaced layout with the path its replacement
/// was uploaded to. The first matching replacement wins. The layout URL is
/// pointed at the uploaded path, keeping its scheme and host; its
/// description is kept. Returns the rewritten pages.
pub async fn rewrite_page_layouts(
    workflow: &DocumentWorkflow<'_>,
    pages_library: &str,
    replacements: &[(AssetReplacement, ServerPath)],
) -> Result<Vec<ServerPath>, EngineError> {
    let client = workflow.client();
    let mut rewritten = Vec::new();

    for page in client.pages(pages_library).await? {
        let Some(layout) = &page.layout else {
            continue;
        };

        let Some((uploaded, url)) = replacements.iter().find_map(|(replacement, uploaded)| {
            retarget(&layout.url, &replacement.replaces, uploaded).map(|url| (uploaded, url))
        }) else {
            continue;
        };

        info!(page = %page.path, layout = %uploaded, "rewriting page layout");
        workflow.ensure_checked_out(&page.path).await?;
        client
            .execute(Batch::single(Mutation::SetPageLayout {
                page: page.path.clone(),
                layout: UrlField {
                    url,
                    description: layout.description.clone(),
                },
            }))
            .await?;
        workflow.finalize(&page.path).await?;

        rewritten.push(page.path);
    }

    if rewritten.is_empty() {
        debug!(library = pages_library, "no pages use a replaced layout");
    }

    Ok(rewritten)
}
