//! Input sanitization and path confinement for agents working in
//! untrusted checkouts.
//!
//! - [`security::identifier`] validates owner/repository names
//! - [`security::path_confiner`] keeps file paths inside a base directory
//! - [`security::shell_quote`] quotes strings for POSIX shell command lines
//! - [`security::scrubber`] redacts URL-embedded credentials from text

pub mod core;
pub mod security;

pub use self::core::*;
pub use security::{
    Identifier, PathConfiner, RepoSlug, SecretScrubber, confine, quote, quote_join, resolve,
    scrub, validate,
};
