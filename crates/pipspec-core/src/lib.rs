//! Lint rules, manifest diffing, and configuration for pipspec.
//!
//! This crate builds on the schema layer: the `Engine` reads manifests and
//! lock files from disk, `lint` checks the structural properties a package
//! manager relies on, `diff_manifests` compares two manifests as sets of
//! entries, and `LintConfig` carries user policy.

pub mod config;
pub mod diff;
pub mod engine;
pub mod lint;

pub use config::{ConfigError, LintConfig};
pub use diff::{diff_files, diff_manifests, ChangedEntry, ManifestDiff};
pub use engine::{default_lock_path, CheckResult, Engine, LockCheckResult};
pub use lint::{lint, Issue, IssueCode, LintReport, Severity};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] pipspec_schema::ManifestError),
    #[error("lock error: {0}")]
    Lock(#[from] pipspec_schema::LockError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
