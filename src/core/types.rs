//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ServerPath`] - Validated server-relative path of a folder or document
//! - [`CheckoutState`] - Who, if anyone, holds a document's checkout
//! - [`PublishLevel`] - Draft vs published version of a document
//! - [`ModerationStatus`] - Approval state of a moderated document
//! - [`ViewKind`] - Rendering kind of a list view
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use sitegraft::core::types::{ServerPath, ViewKind};
//!
//! let path = ServerPath::new("/sites/lab/Documents/report.docx").unwrap();
//! assert_eq!(path.file_name(), "report.docx");
//!
//! assert!(ServerPath::new("relative/path").is_err());
//! assert_eq!(ViewKind::from_tag("GRID"), ViewKind::Grid);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid server path: {0}")]
    InvalidServerPath(String),
}

/// A validated server-relative path.
///
/// Server paths must:
/// - Start with `/`
/// - Not end with `/` (except the root path `/` itself)
/// - Not contain empty segments (`//`) or `.`/`..` segments
/// - Not contain ASCII control characters
///
/// # Example
///
/// ```
/// use sitegraft::core::types::ServerPath;
///
/// let folder = ServerPath::new("/sites/lab/Shared Documents").unwrap();
/// let file = folder.join("plan.docx").unwrap();
/// assert_eq!(file.as_str(), "/sites/lab/Shared Documents/plan.docx");
/// assert_eq!(file.parent().unwrap(), folder);
///
/// assert!(ServerPath::new("").is_err());
/// assert!(ServerPath::new("/a//b").is_err());
/// assert!(ServerPath::new("/a/../b").is_err());
/// assert!(ServerPath::new("/a/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerPath(String);

impl ServerPath {
    /// Create a new validated server path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidServerPath` if the path is malformed.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        Self::validate(&path)?;
        Ok(Self(path))
    }

    fn validate(path: &str) -> Result<(), TypeError> {
        if !path.starts_with('/') {
            return Err(TypeError::InvalidServerPath(format!(
                "'{}' must start with '/'",
                path
            )));
        }

        if path == "/" {
            return Ok(());
        }

        if path.ends_with('/') {
            return Err(TypeError::InvalidServerPath(format!(
                "'{}' cannot end with '/'",
                path
            )));
        }

        if path.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidServerPath(format!(
                "'{}' contains control characters",
                path
            )));
        }

        for segment in path[1..].split('/') {
            match segment {
                "" => {
                    return Err(TypeError::InvalidServerPath(format!(
                        "'{}' contains an empty segment",
                        path
                    )))
                }
                "." | ".." => {
                    return Err(TypeError::InvalidServerPath(format!(
                        "'{}' contains a relative segment",
                        path
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment (empty for the root path).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// The containing folder, or `None` for the root path.
    pub fn parent(&self) -> Option<ServerPath> {
        if self.0 == "/" {
            return None;
        }
        let idx = self.0.rfind('/')?;
        let parent = if idx == 0 { "/" } else { &self.0[..idx] };
        Some(ServerPath(parent.to_string()))
    }

    /// Append a single file or folder name to this path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidServerPath` if `name` would produce an
    /// invalid path (empty, contains `/`, or is a relative segment).
    pub fn join(&self, name: &str) -> Result<ServerPath, TypeError> {
        if name.is_empty() || name.contains('/') {
            return Err(TypeError::InvalidServerPath(format!(
                "'{}' is not a single path segment",
                name
            )));
        }
        if self.0 == "/" {
            ServerPath::new(format!("/{}", name))
        } else {
            ServerPath::new(format!("{}/{}", self.0, name))
        }
    }

    /// Whether `self` is `ancestor` or lies underneath it.
    ///
    /// The comparison is segment-aware: `/a/bc` is not under `/a/b`.
    pub fn starts_with(&self, ancestor: &ServerPath) -> bool {
        if ancestor.0 == "/" {
            return true;
        }
        match self.0.strip_prefix(&ancestor.0) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

impl TryFrom<String> for ServerPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServerPath> for String {
    fn from(path: ServerPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ServerPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServerPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checkout state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Nobody holds the checkout.
    #[default]
    NotCheckedOut,
    /// Checked out to the session running the migration.
    CheckedOutToUser,
    /// Checked out to some other user or an abandoned session.
    CheckedOutToOther,
}

impl CheckoutState {
    /// Whether anyone holds the checkout.
    pub fn is_checked_out(&self) -> bool {
        !matches!(self, CheckoutState::NotCheckedOut)
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutState::NotCheckedOut => write!(f, "not checked out"),
            CheckoutState::CheckedOutToUser => write!(f, "checked out to user"),
            CheckoutState::CheckedOutToOther => write!(f, "checked out to other"),
        }
    }
}

/// Publication level of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishLevel {
    /// Latest version is a draft (minor) version.
    #[default]
    Draft,
    /// Latest version is published (major).
    Published,
}

impl std::fmt::Display for PublishLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishLevel::Draft => write!(f, "draft"),
            PublishLevel::Published => write!(f, "published"),
        }
    }
}

/// Moderation (content approval) status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Waiting for approval.
    Pending,
    /// Approved, or moderation is not enabled.
    #[default]
    Approved,
    /// Rejected, or any status not covered above.
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationStatus::Pending => write!(f, "pending"),
            ModerationStatus::Approved => write!(f, "approved"),
            ModerationStatus::Other => write!(f, "other"),
        }
    }
}

/// Rendering kind of a list view.
///
/// Serialized as the repository's view-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ViewKind {
    Html,
    Grid,
    Calendar,
    Recurrence,
    Chart,
    Gantt,
    #[default]
    None,
}

impl ViewKind {
    /// Map a repository view-type tag to a view kind.
    ///
    /// Unrecognized tags degrade to [`ViewKind::None`].
    ///
    /// ```
    /// use sitegraft::core::types::ViewKind;
    ///
    /// assert_eq!(ViewKind::from_tag("HTML"), ViewKind::Html);
    /// assert_eq!(ViewKind::from_tag("CALENDAR"), ViewKind::Calendar);
    /// assert_eq!(ViewKind::from_tag("TIMELINE"), ViewKind::None);
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "HTML" => ViewKind::Html,
            "GRID" => ViewKind::Grid,
            "CALENDAR" => ViewKind::Calendar,
            "RECURRENCE" => ViewKind::Recurrence,
            "CHART" => ViewKind::Chart,
            "GANTT" => ViewKind::Gantt,
            _ => ViewKind::None,
        }
    }

    /// The repository tag for this kind (empty for `None`).
    pub fn tag(&self) -> &'static str {
        match self {
            ViewKind::Html => "HTML",
            ViewKind::Grid => "GRID",
            ViewKind::Calendar => "CALENDAR",
            ViewKind::Recurrence => "RECURRENCE",
            ViewKind::Chart => "CHART",
            ViewKind::Gantt => "GANTT",
            ViewKind::None => "",
        }
    }
}

impl From<String> for ViewKind {
    fn from(tag: String) -> Self {
        ViewKind::from_tag(&tag)
    }
}

impl From<ViewKind> for &'static str {
    fn from(kind: ViewKind) -> Self {
        kind.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod server_path {
        use super::*;

        #[test]
        fn valid_paths() {
            assert!(ServerPath::new("/").is_ok());
            assert!(ServerPath::new("/sites").is_ok());
            assert!(ServerPath::new("/sites/lab/Shared Documents/a b.docx").is_ok());
            assert!(ServerPath::new("/_catalogs/masterpage/seattle.master").is_ok());
        }

        #[test]
        fn rejects_relative() {
            assert!(matches!(
                ServerPath::new("sites/lab"),
                Err(TypeError::InvalidServerPath(_))
            ));
        }

        #[test]
        fn rejects_trailing_slash() {
            assert!(ServerPath::new("/sites/").is_err());
        }

        #[test]
        fn rejects_empty_and_dot_segments() {
            assert!(ServerPath::new("/a//b").is_err());
            assert!(ServerPath::new("/a/./b").is_err());
            assert!(ServerPath::new("/a/..").is_err());
        }

        #[test]
        fn rejects_control_characters() {
            assert!(ServerPath::new("/a/b\n").is_err());
        }

        #[test]
        fn file_name_and_parent() {
            let p = ServerPath::new("/a/b/doc.txt").unwrap();
            assert_eq!(p.file_name(), "doc.txt");
            assert_eq!(p.parent().unwrap().as_str(), "/a/b");

            let top = ServerPath::new("/a").unwrap();
            assert_eq!(top.parent().unwrap().as_str(), "/");
            assert!(ServerPath::new("/").unwrap().parent().is_none());
        }

        #[test]
        fn join_rejects_nested_names() {
            let p = ServerPath::new("/a").unwrap();
            assert!(p.join("b/c").is_err());
            assert!(p.join("").is_err());
            assert_eq!(p.join("b").unwrap().as_str(), "/a/b");
            assert_eq!(
                ServerPath::new("/").unwrap().join("x").unwrap().as_str(),
                "/x"
            );
        }

        #[test]
        fn starts_with_is_segment_aware() {
            let root = ServerPath::new("/a/b").unwrap();
            assert!(ServerPath::new("/a/b").unwrap().starts_with(&root));
            assert!(ServerPath::new("/a/b/c").unwrap().starts_with(&root));
            assert!(!ServerPath::new("/a/bc").unwrap().starts_with(&root));
            assert!(ServerPath::new("/z").unwrap().starts_with(&ServerPath::new("/").unwrap()));
        }

        #[test]
        fn serde_roundtrip() {
            let p = ServerPath::new("/a/b").unwrap();
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, "\"/a/b\"");
            let parsed: ServerPath = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, p);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<ServerPath, _> = serde_json::from_str("\"no-slash\"");
            assert!(result.is_err());
        }
    }

    #[test]
    fn checkout_state_is_checked_out() {
        assert!(!CheckoutState::NotCheckedOut.is_checked_out());
        assert!(CheckoutState::CheckedOutToUser.is_checked_out());
        assert!(CheckoutState::CheckedOutToOther.is_checked_out());
    }

    #[test]
    fn moderation_status_unknown_maps_to_other() {
        let status: ModerationStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, ModerationStatus::Other);
        let status: ModerationStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, ModerationStatus::Pending);
    }

    #[test]
    fn view_kind_mapping_covers_all_tags() {
        for kind in [
            ViewKind::Html,
            ViewKind::Grid,
            ViewKind::Calendar,
            ViewKind::Recurrence,
            ViewKind::Chart,
            ViewKind::Gantt,
        ] {
            assert_eq!(ViewKind::from_tag(kind.tag()), kind);
        }
        assert_eq!(ViewKind::from_tag(""), ViewKind::None);
        assert_eq!(ViewKind::from_tag("html"), ViewKind::None);
    }

    #[test]
    fn view_kind_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&ViewKind::Calendar).unwrap(), "\"CALENDAR\"");
        let kind: ViewKind = serde_json::from_str("\"GANTT\"").unwrap();
        assert_eq!(kind, ViewKind::Gantt);
        let kind: ViewKind = serde_json::from_str("\"TIMELINE\"").unwrap();
        assert_eq!(kind, ViewKind::None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", PublishLevel::Draft), "draft");
        assert_eq!(format!("{}", ModerationStatus::Pending), "pending");
        assert_eq!(
            format!("{}", CheckoutState::CheckedOutToOther),
            "checked out to other"
        );
    }
}
