//! core::paths
//!
//! Path rewriting shared by content migration and reference rewriting.
//!
//! # Rules
//!
//! - Rebasing is a segment-aware prefix swap: `/a/b/x` moves from `/a/b`
//!   to `/a/c` as `/a/c/x`, while `/a/bc/x` is not under `/a/b` at all.
//! - A reference points at a file when the reference ends with
//!   `"/" + file_name`. Only the final segment is compared, so references
//!   with differing folder roots (or absolute URLs) still match.
//! - Retargeting replaces the whole path of a matching reference. An
//!   absolute URL keeps its scheme and host.
//!
//! # Example
//!
//! ```
//! use sitegraft::core::paths::{rebase, references_file, retarget};
//! use sitegraft::core::types::ServerPath;
//!
//! let from = ServerPath::new("/a/b").unwrap();
//! let to = ServerPath::new("/a/c").unwrap();
//! let doc = ServerPath::new("/a/b/doc.txt").unwrap();
//! assert_eq!(rebase(&doc, &from, &to).unwrap().as_str(), "/a/c/doc.txt");
//!
//! assert!(references_file("/old/masterpage.master", "masterpage.master"));
//! assert!(!references_file("/old/other-masterpage.master", "masterpage.master"));
//!
//! let uploaded = ServerPath::new("/_catalogs/masterpage/new.aspx").unwrap();
//! assert_eq!(
//!     retarget("http://host/_catalogs/masterpage/en-us/old.aspx", "old.aspx", &uploaded).unwrap(),
//!     "http://host/_catalogs/masterpage/new.aspx"
//! );
//! ```

use super::types::ServerPath;

/// Move `path` from underneath `from` to underneath `to`.
///
/// Returns `None` if `path` is not `from` or a descendant of it.
pub fn rebase(path: &ServerPath, from: &ServerPath, to: &ServerPath) -> Option<ServerPath> {
    if !path.starts_with(from) {
        return None;
    }

    let rest = if from.as_str() == "/" {
        path.as_str()
    } else {
        &path.as_str()[from.as_str().len()..]
    };

    let rebased = match (to.as_str(), rest) {
        (to, "") => to.to_string(),
        ("/", rest) => rest.to_string(),
        (to, rest) => format!("{}{}", to, rest),
    };

    // Both halves are already valid, so the joined path is too.
    ServerPath::new(rebased).ok()
}

/// Whether `reference` points at a file named `file_name`.
///
/// An empty `file_name` never matches.
pub fn references_file(reference: &str, file_name: &str) -> bool {
    if file_name.is_empty() {
        return false;
    }
    reference
        .strip_suffix(file_name)
        .is_some_and(|head| head.ends_with('/'))
}

/// Point `reference` at `target` if it references the file `old`.
///
/// Returns `None` when `reference` does not point at `old`. The scheme and
/// host of an absolute URL are kept; the path becomes `target`.
pub fn retarget(reference: &str, old: &str, target: &ServerPath) -> Option<String> {
    if !references_file(reference, old) {
        return None;
    }
    Some(format!("{}{}", origin(reference), target))
}

/// `scheme://host` of an absolute URL, or `""` for a server-relative path.
fn origin(reference: &str) -> &str {
    let Some(scheme_end) = reference.find("://") else {
        return "";
    };
    let authority = scheme_end + 3;
    match reference[authority..].find('/') {
        Some(slash) => &reference[..authority + slash],
        None => reference,
    }
}
