//! repo-guard CLI
//!
//! Identifier validation, path confinement, shell quoting and credential
//! scrubbing from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repo_guard::security::{Identifier, audit_symlinks, confine, quote_join, scrub};
use repo_guard::{GuardConfig, GuardError};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Input sanitization and path confinement for untrusted checkouts
#[derive(Parser)]
#[command(name = "repo-guard")]
#[command(version)]
#[command(about = "Input sanitization and path confinement for untrusted checkouts", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./.repo-guard.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check owner/repository names against the identifier whitelist
    Validate {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// Resolve a relative path inside a base directory
    Resolve {
        /// Trusted base directory (defaults to baseDir from config, then ".")
        #[arg(short, long)]
        base: Option<PathBuf>,

        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Quote arguments as one POSIX shell command line
    Quote {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARG")]
        args: Vec<String>,
    },

    /// Redact URL-embedded credentials from FILE or stdin
    Scrub {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Report symlinks that point outside a base directory
    Audit {
        /// Trusted base directory (defaults to baseDir from config, then ".")
        #[arg(short, long)]
        base: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ValidateVerdict<'a> {
    name: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Serialize)]
struct ResolveVerdict {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", scrub(&format!("{:#}", e)));
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config = GuardConfig::load(cli.config.as_deref(), &cwd)?;
    init_tracing(config.log_level.as_deref());

    match cli.command {
        Commands::Validate { names } => validate_command(&names, cli.json),
        Commands::Resolve { base, path } => {
            let base = base_dir(base, &config);
            resolve_command(&base, &path, cli.json)
        }
        Commands::Quote { args } => {
            println!("{}", quote_join(&args));
            Ok(0)
        }
        Commands::Scrub { file } => scrub_command(file.as_deref(), &config),
        Commands::Audit { base } => {
            let base = base_dir(base, &config);
            audit_command(&base, cli.json)
        }
    }
}

fn init_tracing(config_level: Option<&str>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), config_level))
        .with_writer(io::stderr)
        .init();
}

/// `RUST_LOG` wins, then `logLevel` from config, then `warn`.
fn log_filter(rust_log: Option<&str>, config_level: Option<&str>) -> EnvFilter {
    let parse = |directives: &str| {
        if directives.trim().is_empty() {
            None
        } else {
            EnvFilter::try_new(directives).ok()
        }
    };

    rust_log
        .and_then(parse)
        .or_else(|| config_level.and_then(parse))
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn base_dir(flag: Option<PathBuf>, config: &GuardConfig) -> PathBuf {
    flag.or_else(|| config.base_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn validate_verdict(name: &str) -> ValidateVerdict<'_> {
    match Identifier::parse(name) {
        Ok(_) => ValidateVerdict {
            name,
            valid: true,
            reason: None,
        },
        Err(e) => {
            debug!(code = e.code(), "rejected identifier {:?}", name);
            let reason = match e {
                GuardError::InvalidIdentifier { reason, .. } => reason,
                other => other.to_string(),
            };
            ValidateVerdict {
                name,
                valid: false,
                reason: Some(reason),
            }
        }
    }
}

fn validate_command(names: &[String], json: bool) -> Result<i32> {
    let verdicts: Vec<ValidateVerdict> = names.iter().map(|n| validate_verdict(n)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
    } else {
        for verdict in &verdicts {
            match &verdict.reason {
                None => println!("valid    {}", verdict.name),
                Some(reason) => println!("invalid  {:?}: {}", verdict.name, reason),
            }
        }
    }

    Ok(if verdicts.iter().all(|v| v.valid) { 0 } else { 1 })
}

fn resolve_verdict(base: &Path, path: &Path) -> ResolveVerdict {
    match confine(base, path) {
        Ok(resolved) => {
            debug!(base = %base.display(), "resolved {}", resolved.display());
            ResolveVerdict {
                path: path.to_path_buf(),
                resolved: Some(resolved),
                code: None,
                message: None,
            }
        }
        Err(e) => {
            if e.is_hostile_input() {
                debug!(code = e.code(), "rejected {}", path.display());
            } else {
                warn!(code = e.code(), "{}", e);
            }
            ResolveVerdict {
                path: path.to_path_buf(),
                resolved: None,
                code: Some(e.code()),
                message: Some(e.to_string()),
            }
        }
    }
}

fn resolve_command(base: &Path, path: &Path, json: bool) -> Result<i32> {
    let verdict = resolve_verdict(base, path);

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else if let Some(resolved) = &verdict.resolved {
        println!("{}", resolved.display());
    } else if let Some(message) = &verdict.message {
        eprintln!("rejected: {}", message);
    }

    Ok(if verdict.resolved.is_some() { 0 } else { 1 })
}

fn scrub_command(file: Option<&Path>, config: &GuardConfig) -> Result<i32> {
    let scrubber = config.scrubber()?;

    let input = match file {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let output = scrubber.scrub_bytes(&input);
    let mut stdout = io::stdout().lock();
    stdout.write_all(&output).context("failed to write output")?;
    stdout.flush().context("failed to write output")?;

    Ok(0)
}

fn audit_command(base: &Path, json: bool) -> Result<i32> {
    let report = audit_symlinks(base)?;
    info!(
        scanned = report.scanned_links,
        escaping = report.escaping.len(),
        skipped = report.skipped.len(),
        "symlink audit finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for finding in &report.escaping {
            println!(
                "{}  {} -> {}",
                finding.code,
                finding.link.display(),
                finding.target.display()
            );
        }
        for skipped in &report.skipped {
            warn!("could not inspect {}", skipped.display());
        }
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}
