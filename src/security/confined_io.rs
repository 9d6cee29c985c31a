//! Confined file access with check-at-use-time discipline
//!
//! [`open_confined`] opens the exact path that confinement verified and, on
//! unix, confirms the opened handle is still that object. [`create_confined`]
//! re-runs confinement immediately before every directory it creates and
//! creates the leaf exclusively, so a symlink planted at the final component
//! makes the create fail instead of being followed.
//!
//! A race remains between the last check and each `mkdir`/`open` syscall.
//! It is narrowed here, not eliminated.

use crate::core::error::GuardError;
use crate::security::path_confiner::confine;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Open an existing file inside `base` for reading.
///
/// # Errors
///
/// Any confinement error, `GuardError::Io` if the file cannot be opened, or
/// `GuardError::PathEscape` if the file was swapped between check and open.
pub fn open_confined(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<File, GuardError> {
    let resolved = confine(base, relative)?;
    let file = File::open(&resolved).map_err(|e| io_error(&resolved, &e))?;

    #[cfg(unix)]
    verify_same_object(&file, &resolved)?;

    Ok(file)
}

/// Create a new file inside `base`, creating missing parent directories.
///
/// Fails if the leaf already exists.
///
/// # Errors
///
/// Any confinement error (re-checked before each directory level and before
/// the leaf), or `GuardError::Io` if a create fails.
pub fn create_confined(
    base: impl AsRef<Path>,
    relative: impl AsRef<Path>,
) -> Result<File, GuardError> {
    let base = base.as_ref();
    let relative = relative.as_ref();
    let target = confine(base, relative)?;

    let missing_dirs: Vec<PathBuf> = target
        .ancestors()
        .skip(1)
        .take_while(|dir| fs::symlink_metadata(dir).is_err())
        .map(Path::to_path_buf)
        .collect();

    for dir in missing_dirs.iter().rev() {
        let checked = confine(base, dir)?;
        match fs::create_dir(&checked) {
            Ok(()) => {}
            // Someone else created it; the next confine call re-verifies it.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(io_error(&checked, &e)),
        }
    }

    let leaf = confine(base, relative)?;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&leaf)
        .map_err(|e| io_error(&leaf, &e))
}

#[cfg(unix)]
fn verify_same_object(file: &File, path: &Path) -> Result<(), GuardError> {
    use std::os::unix::fs::MetadataExt;

    let opened = file.metadata().map_err(|e| io_error(path, &e))?;
    let on_disk = fs::symlink_metadata(path).map_err(|e| io_error(path, &e))?;

    if opened.dev() == on_disk.dev() && opened.ino() == on_disk.ino() {
        Ok(())
    } else {
        Err(GuardError::PathEscape {
            path: path.to_path_buf(),
        })
    }
}

fn io_error(path: &Path, error: &io::Error) -> GuardError {
    GuardError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
