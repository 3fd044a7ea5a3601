//! remote::batch
//!
//! Typed mutations and the batches that carry them.
//!
//! # Design
//!
//! Mutations are plain data: building a batch performs no I/O and changes
//! nothing. A batch only takes effect when handed to
//! [`RepositoryClient::execute`](super::RepositoryClient::execute), which
//! is the single flush point for every write the engine makes.
//!
//! # Example
//!
//! ```
//! use sitegraft::core::types::ServerPath;
//! use sitegraft::remote::{Batch, CheckInKind, Mutation};
//!
//! let path = ServerPath::new("/_catalogs/masterpage/contoso.master").unwrap();
//! let batch = Batch::new()
//!     .with(Mutation::UndoCheckOut { path: path.clone() })
//!     .with(Mutation::CheckOut { path: path.clone() });
//!
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch.mutations()[0].name(), "undo_check_out");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traits::{ListSettings, UrlField, ViewDef};
use crate::core::types::ServerPath;

/// How a check-in records the new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInKind {
    Minor,
    Major,
    Overwrite,
}

/// A single write against the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Create a list from a template.
    CreateList { title: String, template: u32 },

    /// Delete a list and everything in it.
    DeleteList { title: String },

    /// Overwrite a list's versioning and moderation settings.
    UpdateListSettings { list: String, settings: ListSettings },

    /// Allow a list to carry more than its default content type.
    EnableContentTypes { list: String },

    /// Attach a site-level content type definition to a list.
    AddContentType {
        list: String,
        /// Id of the site-level definition (never a list-level copy)
        content_type_id: String,
    },

    /// Detach a content type from a list.
    RemoveContentType {
        list: String,
        /// Id of the list-level content type
        content_type_id: String,
    },

    /// Create a view on a list.
    AddView { list: String, view: ViewDef },

    /// Delete a view by title.
    RemoveView { list: String, title: String },

    /// Copy a document to a new path.
    CopyDocument {
        source: ServerPath,
        destination: ServerPath,
        overwrite: bool,
    },

    /// Upload file content into a folder.
    UploadFile {
        folder: ServerPath,
        name: String,
        /// Raw bytes, base64 on the wire
        #[serde(with = "base64_content")]
        content: Vec<u8>,
        overwrite: bool,
    },

    /// Set list item fields of a document.
    UpdateItemFields {
        path: ServerPath,
        fields: BTreeMap<String, String>,
    },

    CheckOut { path: ServerPath },

    UndoCheckOut { path: ServerPath },

    CheckIn {
        path: ServerPath,
        comment: String,
        kind: CheckInKind,
    },

    Publish { path: ServerPath, comment: String },

    Approve { path: ServerPath, comment: String },

    /// Write a site property bag value.
    SetSiteProperty { key: String, value: String },

    /// Update master page references of the site; `None` leaves a field alone.
    UpdateSite {
        master_url: Option<String>,
        custom_master_url: Option<String>,
    },

    /// Point a page at a (new) layout.
    SetPageLayout { page: ServerPath, layout: UrlField },
}

impl Mutation {
    /// Stable snake_case name of the mutation kind.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateList { .. } => "create_list",
            Mutation::DeleteList { .. } => "delete_list",
            Mutation::UpdateListSettings { .. } => "update_list_settings",
            Mutation::EnableContentTypes { .. } => "enable_content_types",
            Mutation::AddContentType { .. } => "add_content_type",
            Mutation::RemoveContentType { .. } => "remove_content_type",
            Mutation::AddView { .. } => "add_view",
            Mutation::RemoveView { .. } => "remove_view",
            Mutation::CopyDocument { .. } => "copy_document",
            Mutation::UploadFile { .. } => "upload_file",
            Mutation::UpdateItemFields { .. } => "update_item_fields",
            Mutation::CheckOut { .. } => "check_out",
            Mutation::UndoCheckOut { .. } => "undo_check_out",
            Mutation::CheckIn { .. } => "check_in",
            Mutation::Publish { .. } => "publish",
            Mutation::Approve { .. } => "approve",
            Mutation::SetSiteProperty { .. } => "set_site_property",
            Mutation::UpdateSite { .. } => "update_site",
            Mutation::SetPageLayout { .. } => "set_page_layout",
        }
    }

    /// Human-readable one-line description.
    pub fn description(&self) -> String {
        match self {
            Mutation::CreateList { title, template } => {
                format!("create list '{}' (template {})", title, template)
            }
            Mutation::DeleteList { title } => format!("delete list '{}'", title),
            Mutation::UpdateListSettings { list, .. } => {
                format!("update settings of '{}'", list)
            }
            Mutation::EnableContentTypes { list } => {
                format!("enable content types on '{}'", list)
            }
            Mutation::AddContentType {
                list,
                content_type_id,
            } => format!("add content type {} to '{}'", content_type_id, list),
            Mutation::RemoveContentType {
                list,
                content_type_id,
            } => format!("remove content type {} from '{}'", content_type_id, list),
            Mutation::AddView { list, view } => {
                format!("add view '{}' to '{}'", view.title, list)
            }
            Mutation::RemoveView { list, title } => {
                format!("remove view '{}' from '{}'", title, list)
            }
            Mutation::CopyDocument {
                source,
                destination,
                ..
            } => format!("copy {} -> {}", source, destination),
            Mutation::UploadFile { folder, name, .. } => {
                format!("upload {} into {}", name, folder)
            }
            Mutation::UpdateItemFields { path, fields } => {
                format!("update {} field(s) of {}", fields.len(), path)
            }
            Mutation::CheckOut { path } => format!("check out {}", path),
            Mutation::UndoCheckOut { path } => format!("undo check out {}", path),
            Mutation::CheckIn { path, .. } => format!("check in {}", path),
            Mutation::Publish { path, .. } => format!("publish {}", path),
            Mutation::Approve { path, .. } => format!("approve {}", path),
            Mutation::SetSiteProperty { key, .. } => format!("set site property {}", key),
            Mutation::UpdateSite { .. } => "update site master pages".to_string(),
            Mutation::SetPageLayout { page, layout } => {
                format!("point {} at {}", page, layout.url)
            }
        }
    }
}

/// An ordered group of mutations flushed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    mutations: Vec<Mutation>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch holding one mutation.
    pub fn single(mutation: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
        }
    }

    /// Append a mutation (builder style).
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Append a mutation.
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

impl FromIterator<Mutation> for Batch {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

impl Extend<Mutation> for Batch {
    fn extend<I: IntoIterator<Item = Mutation>>(&mut self, iter: I) {
        self.mutations.extend(iter);
    }
}

mod base64_content {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
