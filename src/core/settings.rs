//! core::settings
//!
//! Branding settings document parsing.
//!
//! The settings document lists the assets to replace, in order:
//!
//! ```xml
//! <branding>
//!   <masterPages>
//!     <masterPage file="contoso.master" replaces="seattle.master" />
//!   </masterPages>
//!   <pageLayouts>
//!     <pageLayout file="ContosoArticle.aspx" replaces="ArticleLeft.aspx"
//!                 title="Contoso Article" associatedContentTypeName="Article Page"
//!                 defaultLayout="true" />
//!   </pageLayouts>
//! </branding>
//! ```
//!
//! Elements are matched by name anywhere in the document; the container
//! elements are optional. `file` and `replaces` are required.

use std::path::{Path, PathBuf};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors from loading the settings document.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed settings document: {0}")]
    Malformed(String),

    #[error("<{element}> #{index} is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        index: usize,
        attribute: &'static str,
    },

    #[error("<{element}> #{index} has invalid {attribute}='{value}'")]
    InvalidAttribute {
        element: &'static str,
        index: usize,
        attribute: &'static str,
        value: String,
    },
}

/// Which kind of branding asset a replacement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    MasterPage,
    PageLayout,
}

impl AssetKind {
    fn element(&self) -> &'static str {
        match self {
            AssetKind::MasterPage => "masterPage",
            AssetKind::PageLayout => "pageLayout",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::MasterPage => write!(f, "master page"),
            AssetKind::PageLayout => write!(f, "page layout"),
        }
    }
}

/// One asset replacement declared in the settings document.
///
/// Identity key is [`replaces`](Self::replaces), the file name of the asset
/// being retired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReplacement {
    pub kind: AssetKind,
    /// Name of the new file (also its local path relative to the settings file).
    pub file: String,
    /// Name of the file being replaced.
    pub replaces: String,
    pub title: Option<String>,
    pub associated_content_type: Option<String>,
    pub default_layout: bool,
}

impl AssetReplacement {
    /// A master page replacement with no optional attributes.
    pub fn master_page(file: impl Into<String>, replaces: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::MasterPage,
            file: file.into(),
            replaces: replaces.into(),
            title: None,
            associated_content_type: None,
            default_layout: false,
        }
    }

    /// A page layout replacement with no optional attributes.
    pub fn page_layout(file: impl Into<String>, replaces: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::PageLayout,
            ..Self::master_page(file, replaces)
        }
    }

    /// The file name the new asset is uploaded under.
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }
}

/// Parsed settings document.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub master_pages: Vec<AssetReplacement>,
    pub page_layouts: Vec<AssetReplacement>,
    /// Directory asset files are resolved against.
    pub base_dir: PathBuf,
}

impl Settings {
    /// Load and parse a settings file.
    ///
    /// Asset files are later resolved relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut settings = Self::parse(&content)?;
        settings.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(settings)
    }

    /// Parse a settings document from a string.
    pub fn parse(xml: &str) -> Result<Self, SettingsError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut settings = Settings::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let kind = match e.name().as_ref() {
                        b"masterPage" => AssetKind::MasterPage,
                        b"pageLayout" => AssetKind::PageLayout,
                        _ => continue,
                    };
                    let target = match kind {
                        AssetKind::MasterPage => &mut settings.master_pages,
                        AssetKind::PageLayout => &mut settings.page_layouts,
                    };
                    let index = target.len() + 1;
                    target.push(parse_replacement(&e, kind, index)?);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(SettingsError::Malformed(e.to_string())),
            }
        }

        Ok(settings)
    }

    /// Local path of an asset's file.
    pub fn asset_path(&self, asset: &AssetReplacement) -> PathBuf {
        self.base_dir.join(&asset.file)
    }

    /// Whether the document declared nothing to do.
    pub fn is_empty(&self) -> bool {
        self.master_pages.is_empty() && self.page_layouts.is_empty()
    }
}

fn parse_replacement(
    element: &BytesStart<'_>,
    kind: AssetKind,
    index: usize,
) -> Result<AssetReplacement, SettingsError> {
    let mut file = None;
    let mut replaces = None;
    let mut title = None;
    let mut associated_content_type = None;
    let mut default_layout = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| SettingsError::Malformed(e.to_string()))?;
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw)
            .map_err(|e| SettingsError::Malformed(e.to_string()))?
            .into_owned();

        match attr.key.as_ref() {
            b"file" => file = Some(value),
            b"replaces" => replaces = Some(value),
            b"title" => title = Some(value),
            b"associatedContentTypeName" => associated_content_type = Some(value),
            b"defaultLayout" => default_layout = Some(value),
            _ => {}
        }
    }

    let required = |value: Option<String>, attribute| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or(SettingsError::MissingAttribute {
                element: kind.element(),
                index,
                attribute,
            })
    };

    let default_layout = match default_layout.as_deref().map(str::trim) {
        None => false,
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        Some(other) => {
            return Err(SettingsError::InvalidAttribute {
                element: kind.element(),
                index,
                attribute: "defaultLayout",
                value: other.to_string(),
            })
        }
    };

    Ok(AssetReplacement {
        kind,
        file: required(file, "file")?,
        replaces: required(replaces, "replaces")?,
        title,
        associated_content_type,
        default_layout,
    })
}
