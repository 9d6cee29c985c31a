//! Symlink audit for a working directory
//!
//! Walks a base directory without following links and runs every symlink it
//! finds through confinement. Links whose target leaves the base, and
//! dangling links, are reported.

use crate::core::error::GuardError;
use crate::security::path_confiner::confine;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A symlink that failed confinement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymlinkFinding {
    /// Link location, relative to the base
    pub link: PathBuf,
    /// Raw link target as stored on disk
    pub target: PathBuf,
    /// Error code from confinement
    pub code: &'static str,
}

/// Report from auditing a base directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct SymlinkAuditReport {
    pub escaping: Vec<SymlinkFinding>,
    pub scanned_links: usize,
    pub skipped: Vec<PathBuf>,
}

impl SymlinkAuditReport {
    pub fn is_clean(&self) -> bool {
        self.escaping.is_empty()
    }
}

/// Audit every symlink under `base`
///
/// # Errors
///
/// Returns `GuardError::BaseUnavailable` if `base` cannot be resolved.
/// Entries that cannot be read are listed in `skipped` instead, as are links
/// confinement cannot resolve at all. A self-referential link (`ELOOP`) is
/// therefore skipped, not reported as escaping.
///
/// # Examples
///
/// ```no_run
/// use repo_guard::security::symlink_audit::audit_symlinks;
///
/// let report = audit_symlinks("/tmp/repo").unwrap();
/// for finding in &report.escaping {
///     println!("{} -> {}", finding.link.display(), finding.target.display());
/// }
/// ```
pub fn audit_symlinks(base: impl AsRef<Path>) -> Result<SymlinkAuditReport, GuardError> {
    let base = base.as_ref();
    fs::canonicalize(base).map_err(|e| GuardError::BaseUnavailable {
        base: base.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut report = SymlinkAuditReport::default();

    for entry in WalkDir::new(base).follow_links(false).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if let Some(path) = err.path() {
                    report.skipped.push(path.to_path_buf());
                }
                continue;
            }
        };

        if !entry.path_is_symlink() {
            continue;
        }
        report.scanned_links += 1;

        let Ok(relative) = entry.path().strip_prefix(base) else {
            report.skipped.push(entry.path().to_path_buf());
            continue;
        };

        match confine(base, relative) {
            Ok(_) => {}
            Err(err) if err.is_hostile_input() => match fs::read_link(entry.path()) {
                Ok(target) => report.escaping.push(SymlinkFinding {
                    link: relative.to_path_buf(),
                    target,
                    code: err.code(),
                }),
                Err(_) => report.skipped.push(entry.path().to_path_buf()),
            },
            Err(_) => report.skipped.push(entry.path().to_path_buf()),
        }
    }

    Ok(report)
}
