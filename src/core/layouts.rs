//! core::layouts
//!
//! Codec for the site-level page layout registry.
//!
//! Two site properties describe which page layouts a site offers:
//!
//! - `__PageLayouts`: `<pagelayouts><layout guid="…" url="…" />…</pagelayouts>`
//! - `__DefaultPageLayout`: a single `<layout guid="…" url="…" />`
//!
//! Rewriting an entry keeps any other attributes on it intact so the
//! document can be written back without losing data it did not touch.

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::paths::references_file;

/// Site property holding the available layouts.
pub const AVAILABLE_LAYOUTS_PROPERTY: &str = "__PageLayouts";

/// Site property holding the default layout.
pub const DEFAULT_LAYOUT_PROPERTY: &str = "__DefaultPageLayout";

const DEFAULT_ROOT: &str = "pagelayouts";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("malformed layout document: {0}")]
    Malformed(String),

    #[error("layout element is missing '{0}'")]
    MissingAttribute(&'static str),

    #[error("no layout element found")]
    Empty,
}

/// One `<layout>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub guid: String,
    pub url: String,
    /// Attributes other than `guid` and `url`, in document order.
    pub extra: Vec<(String, String)>,
}

impl LayoutEntry {
    pub fn new(guid: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            url: url.into(),
            extra: Vec::new(),
        }
    }

    /// Parse a standalone `<layout … />` document.
    pub fn parse(xml: &str) -> Result<Self, LayoutError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"layout" => {
                    return entry_from(&e);
                }
                Ok(Event::Eof) => return Err(LayoutError::Empty),
                Ok(_) => {}
                Err(e) => return Err(LayoutError::Malformed(e.to_string())),
            }
        }
    }

    /// Serialize as a self-closing `<layout … />` element.
    pub fn to_xml(&self) -> String {
        let mut out = format!(
            "<layout guid=\"{}\" url=\"{}\"",
            escape(self.guid.as_str()),
            escape(self.url.as_str())
        );
        for (key, value) in &self.extra {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }
        out.push_str(" />");
        out
    }
}

/// The available page layouts of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRegistry {
    root: String,
    pub entries: Vec<LayoutEntry>,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            entries: Vec::new(),
        }
    }
}

impl LayoutRegistry {
    /// Parse the `__PageLayouts` property value.
    ///
    /// A blank value is an empty registry.
    pub fn parse(xml: &str) -> Result<Self, LayoutError> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut root = None;
        let mut entries = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.name().as_ref() == b"layout" {
                        entries.push(entry_from(&e)?);
                    } else if root.is_none() {
                        root = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(LayoutError::Malformed(e.to_string())),
            }
        }

        Ok(Self {
            root: root.unwrap_or_else(|| DEFAULT_ROOT.to_string()),
            entries,
        })
    }

    /// Serialize back into a property value.
    pub fn to_xml(&self) -> String {
        let mut out = format!("<{}>", self.root);
        for entry in &self.entries {
            out.push_str(&entry.to_xml());
        }
        out.push_str(&format!("</{}>", self.root));
        out
    }

    /// Point the first entry referencing `replaced_file` at a new layout.
    ///
    /// Returns `true` if an entry was rewritten.
    pub fn replace(&mut self, replaced_file: &str, guid: &str, url: &str) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| references_file(&entry.url, replaced_file))
        {
            Some(entry) => {
                entry.guid = guid.to_string();
                entry.url = url.to_string();
                true
            }
            None => false,
        }
    }
}

fn entry_from(element: &BytesStart<'_>) -> Result<LayoutEntry, LayoutError> {
    let mut guid = None;
    let mut url = None;
    let mut extra = Vec::new();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| LayoutError::Malformed(e.to_string()))?;
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw)
            .map_err(|e| LayoutError::Malformed(e.to_string()))?
            .into_owned();
        match attr.key.as_ref() {
            b"guid" => guid = Some(value),
            b"url" => url = Some(value),
            key => extra.push((String::from_utf8_lossy(key).into_owned(), value)),
        }
    }

    Ok(LayoutEntry {
        guid: guid.ok_or(LayoutError::MissingAttribute("guid"))?,
        url: url.ok_or(LayoutError::MissingAttribute("url"))?,
        extra,
    })
}
