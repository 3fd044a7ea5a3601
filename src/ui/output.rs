//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Progress and summaries go to stdout and respect the quiet flag.
//! Diagnostics go through `tracing`; errors are always shown.

use std::fmt::Display;

use crate::engine::branding::BrandingReport;
use crate::engine::lists::{ListReplacement, ListReport};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// One-line summary of a replaced list.
pub fn format_list_replacement(r: &ListReplacement) -> String {
    format!(
        "{} -> {}: +{} -{} content types, +{} -{} views, {} copied",
        r.source,
        r.replacement,
        r.content_types.added.len(),
        r.content_types.removed.len(),
        r.views.added.len(),
        r.views.removed.len(),
        plural(r.migration.len(), "document"),
    )
}

/// Summary of a list replacement run.
pub fn format_list_report(report: &ListReport) -> String {
    if report.replaced.is_empty() {
        return "No lists to replace.".to_string();
    }
    let lines: Vec<String> = report.replaced.iter().map(format_list_replacement).collect();
    format!(
        "Replaced {}:\n{}",
        plural(report.replaced.len(), "list"),
        format_list(&lines, "  ")
    )
}

/// Summary of a branding replacement run.
pub fn format_branding_report(report: &BrandingReport) -> String {
    let mut out = format!(
        "Uploaded {} and {}.",
        plural(report.master_pages.len(), "master page"),
        plural(report.page_layouts.len(), "page layout"),
    );
    if report.site_updated {
        out.push_str("\nSite master page references updated.");
    }
    if !report.pages.is_empty() {
        out.push_str(&format!(
            "\nRepointed {}:\n{}",
            plural(report.pages.len(), "page"),
            format_list(&report.pages, "  ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ServerPath;
    use crate::engine::{MigrationReport, ReconcileReport};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn format_list_prefixes_items() {
        assert_eq!(format_list(&["a", "b"], "- "), "- a\n- b");
        assert_eq!(format_list::<&str>(&[], "- "), "");
    }

    #[test]
    fn list_report_summary() {
        let report = ListReport {
            replaced: vec![ListReplacement {
                source: "Contoso".into(),
                replacement: "ContosoApp".into(),
                recreated: false,
                content_types: ReconcileReport {
                    added: vec!["Article Page".into()],
                    removed: vec![],
                },
                views: ReconcileReport {
                    added: vec!["By Author".into()],
                    removed: vec!["All Documents".into()],
                },
                migration: MigrationReport {
                    copied: vec![(
                        ServerPath::new("/Contoso/a.docx").unwrap(),
                        ServerPath::new("/ContosoApp/a.docx").unwrap(),
                    )],
                },
            }],
        };
        assert_eq!(
            format_list_report(&report),
            "Replaced 1 list:\n  Contoso -> ContosoApp: +1 -0 content types, +1 -1 views, 1 document copied"
        );
        assert_eq!(format_list_report(&ListReport::default()), "No lists to replace.");
    }

    #[test]
    fn branding_report_summary() {
        let report = BrandingReport {
            master_pages: vec![ServerPath::new("/_catalogs/masterpage/new.master").unwrap()],
            page_layouts: vec![],
            site_updated: true,
            pages: vec![ServerPath::new("/Pages/home.aspx").unwrap()],
        };
        assert_eq!(
            format_branding_report(&report),
            "Uploaded 1 master page and 0 page layouts.\n\
             Site master page references updated.\n\
             Repointed 1 page:\n  /Pages/home.aspx"
        );
    }
}
