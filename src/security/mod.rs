pub mod confined_io;
pub mod identifier;
pub mod path_confiner;
pub mod remote;
pub mod scrubber;
pub mod shell_quote;
pub mod symlink_audit;

pub use confined_io::{create_confined, open_confined};
pub use identifier::{Identifier, validate};
pub use path_confiner::{PathConfiner, confine, resolve};
pub use remote::RepoSlug;
pub use scrubber::{SecretScrubber, scrub, scrub_bytes};
pub use shell_quote::{quote, quote_join};
pub use symlink_audit::{SymlinkAuditReport, SymlinkFinding, audit_symlinks};
