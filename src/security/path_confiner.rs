//! Path Confiner - Resolves untrusted relative paths inside a trusted base
//!
//! Defends against `..` traversal and symlink escape, including for targets
//! that do not exist yet.
//!
//! Resolution order:
//!
//! 1. Lexically normalize the base and join the candidate onto it.
//! 2. Reject if the lexical result is not the base or under it.
//! 3. Resolve symlinks on the base (`RealBase`). Failure rejects.
//! 4. Resolve symlinks on the full path. An existing path must resolve under
//!    `RealBase` and its real path is returned. A missing path is accepted only
//!    if its nearest existing ancestor resolves under `RealBase`, and then the
//!    lexical path is returned. Any other resolution error rejects.
//!
//! Paths returned for missing targets are only valid until something else
//! changes the filesystem. Re-check immediately before creating them (see
//! [`crate::security::confined_io`]).
//!
//! # Example
//!
//! ```no_run
//! use repo_guard::security::path_confiner::resolve;
//!
//! assert!(resolve("/tmp/repo", "subdir/../../outside").is_none());
//! assert!(resolve("/tmp/repo", "new/file.txt").is_some());
//! ```

use crate::core::error::GuardError;
use path_clean::PathClean;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve `relative` against `base`, returning `None` on any rejection.
pub fn resolve(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> Option<PathBuf> {
    confine(base, relative).ok()
}

/// Resolve `relative` against `base`, reporting why a path was rejected.
///
/// # Errors
///
/// - `GuardError::PathEscape` - the path leaves the base lexically or via a symlink
/// - `GuardError::BaseUnavailable` - the base itself cannot be resolved
/// - `GuardError::UnexpectedFilesystemError` - resolution failed for a reason
///   other than the path not existing
pub fn confine(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
    let normalized_base = absolutize(base.as_ref())?;
    let full_path = normalized_base.join(relative.as_ref()).clean();

    if !full_path.starts_with(&normalized_base) {
        return Err(GuardError::PathEscape { path: full_path });
    }

    let real_base =
        fs::canonicalize(&normalized_base).map_err(|e| GuardError::BaseUnavailable {
            base: normalized_base.clone(),
            message: e.to_string(),
        })?;

    match fs::canonicalize(&full_path) {
        Ok(real_path) => {
            if real_path.starts_with(&real_base) {
                Ok(real_path)
            } else {
                Err(GuardError::PathEscape { path: full_path })
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            reject_dangling_symlink(&full_path)?;
            check_nearest_ancestor(&full_path, &normalized_base, &real_base)?;
            Ok(full_path)
        }
        Err(e) => Err(unexpected(&full_path, &e)),
    }
}

/// A trusted base directory for repeated confinement calls
///
/// Holds no resolved state: every call resolves the base again, so a base
/// that disappears or is swapped for a symlink is noticed on the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfiner {
    base: PathBuf,
}

impl PathConfiner {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        resolve(&self.base, relative)
    }

    pub fn confine(&self, relative: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        confine(&self.base, relative)
    }
}

/// Walk upward from the parent of `full_path` to the first ancestor that
/// exists and require it to resolve under `real_base`.
fn check_nearest_ancestor(
    full_path: &Path,
    normalized_base: &Path,
    real_base: &Path,
) -> Result<(), GuardError> {
    for ancestor in full_path.ancestors().skip(1) {
        if !ancestor.starts_with(normalized_base) {
            break;
        }

        match fs::canonicalize(ancestor) {
            Ok(real_ancestor) => {
                return if real_ancestor.starts_with(real_base) {
                    Ok(())
                } else {
                    Err(GuardError::PathEscape {
                        path: full_path.to_path_buf(),
                    })
                };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                reject_dangling_symlink(ancestor)?;
            }
            Err(e) => return Err(unexpected(ancestor, &e)),
        }
    }

    // The base resolved a moment ago; reaching here means it vanished mid-walk.
    Err(GuardError::BaseUnavailable {
        base: normalized_base.to_path_buf(),
        message: "no existing ancestor inside base".to_string(),
    })
}

/// `canonicalize` reports a dangling symlink as missing, but creating through
/// it would follow the link wherever it points.
fn reject_dangling_symlink(path: &Path) -> Result<(), GuardError> {
    match fs::symlink_metadata(path) {
        Ok(_) => Err(GuardError::PathEscape {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(unexpected(path, &e)),
    }
}

fn unexpected(path: &Path, error: &io::Error) -> GuardError {
    GuardError::UnexpectedFilesystemError {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Make `base` absolute against the current directory and clean it,
/// without touching the filesystem beyond reading the current directory.
fn absolutize(base: &Path) -> Result<PathBuf, GuardError> {
    if base.is_absolute() {
        return Ok(base.clean());
    }

    let cwd = env::current_dir().map_err(|e| GuardError::BaseUnavailable {
        base: base.to_path_buf(),
        message: format!("cannot read current directory: {}", e),
    })?;
    Ok(cwd.join(base).clean())
}
