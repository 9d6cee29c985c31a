//! Error handling for repo-guard
//!
//! This module provides the shared error vocabulary for identifier validation,
//! path confinement and configuration loading, using the thiserror crate.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for guard operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    // Input validation errors
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    // Confinement errors
    #[error("path escapes the base directory: {}", path.display())]
    PathEscape { path: PathBuf },

    #[error("base directory is unavailable: {} ({message})", base.display())]
    BaseUnavailable { base: PathBuf, message: String },

    #[error("unexpected filesystem error at {}: {message}", path.display())]
    UnexpectedFilesystemError { path: PathBuf, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors from confined file operations
    #[error("I/O error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl GuardError {
    /// Check if this error was caused by hostile or malformed input, as opposed
    /// to a problem with the environment
    pub fn is_hostile_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::PathEscape { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidIdentifier { .. } => vec![
                "Use only letters, digits, '.', '_' and '-'",
                "Keep names between 1 and 100 characters",
            ],
            Self::PathEscape { .. } => vec![
                "Use a path relative to the working directory",
                "Remove '..' segments and symlinks that point outside the working directory",
            ],
            Self::BaseUnavailable { .. } => vec![
                "Check that the base directory exists",
                "Check permissions on the base directory",
            ],
            Self::UnexpectedFilesystemError { .. } => {
                vec!["Check permissions along the requested path"]
            }
            Self::Config(_) => vec![
                "Check the YAML syntax of the configuration file",
                "Credential labels must use only letters, digits, '.', '_' and '-'",
            ],
            Self::Io { .. } => vec![
                "When opening, check that the file exists and is readable",
                "When creating, check that the target does not already exist",
                "Check permissions on the parent directory",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            Self::PathEscape { .. } => "PATH_ESCAPE",
            Self::BaseUnavailable { .. } => "BASE_UNAVAILABLE",
            Self::UnexpectedFilesystemError { .. } => "UNEXPECTED_FILESYSTEM_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_error() {
        let error = GuardError::InvalidIdentifier {
            value: "../evil".to_string(),
            reason: "parent directory sequence".to_string(),
        };

        assert!(error.is_hostile_input());
        assert_eq!(error.code(), "INVALID_IDENTIFIER");
        assert!(error.to_string().contains("../evil"));
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_path_escape_error() {
        let error = GuardError::PathEscape {
            path: PathBuf::from("/tmp/repo/../outside"),
        };

        assert!(error.is_hostile_input());
        assert_eq!(error.code(), "PATH_ESCAPE");
        assert!(error.to_string().contains("/tmp/repo/../outside"));
    }

    #[test]
    fn test_base_unavailable_is_environmental() {
        let error = GuardError::BaseUnavailable {
            base: PathBuf::from("/nonexistent"),
            message: "No such file or directory".to_string(),
        };

        assert!(!error.is_hostile_input());
        assert_eq!(error.code(), "BASE_UNAVAILABLE");
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("exists")));
    }

    #[test]
    fn test_unexpected_filesystem_error() {
        let error = GuardError::UnexpectedFilesystemError {
            path: PathBuf::from("/tmp/repo/locked"),
            message: "Permission denied".to_string(),
        };

        assert!(!error.is_hostile_input());
        assert_eq!(error.code(), "UNEXPECTED_FILESYSTEM_ERROR");
        assert!(error.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_config_error_display() {
        let error = GuardError::Config("bad label".to_string());

        assert_eq!(error.code(), "CONFIG_ERROR");
        assert_eq!(error.to_string(), "configuration error: bad label");
    }

    #[test]
    fn test_io_error_suggestions_cover_open_and_create() {
        let error = GuardError::Io {
            path: PathBuf::from("/tmp/repo/missing.txt"),
            message: "No such file or directory".to_string(),
        };

        assert!(!error.is_hostile_input());
        assert_eq!(error.code(), "IO_ERROR");
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.starts_with("When opening")));
        assert!(actions.iter().any(|a| a.starts_with("When creating")));
    }
}
