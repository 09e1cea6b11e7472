//! Resolved lock files (`Pipfile.lock`) and drift checks against a manifest.
//!
//! Resolution itself belongs to the package manager; this module only reads
//! its output and reports where the locked state no longer satisfies what the
//! manifest declares.

use crate::constraint::VersionConstraint;
use crate::entry::Section;
use crate::manifest::{ManifestError, SourceSection};
use crate::normalize::{NormalizedPackage, NormalizedPipfile};
use crate::types::CanonicalName;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("lock file manifest drift: {0}")]
    ManifestDrift(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    #[serde(rename = "_meta")]
    pub meta: LockMeta,
    #[serde(default)]
    pub default: BTreeMap<String, LockedPackage>,
    #[serde(default)]
    pub develop: BTreeMap<String, LockedPackage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockMeta {
    #[serde(default)]
    pub hash: BTreeMap<String, String>,
    #[serde(default, rename = "pipfile-spec")]
    pub pipfile_spec: Option<u32>,
    #[serde(default)]
    pub requires: BTreeMap<String, String>,
    #[serde(default)]
    pub sources: Vec<SourceSection>,
}

/// A pinned package as written by the resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl LockedPackage {
    /// The pinned version, with the leading `==` removed.
    pub fn pinned_version(&self) -> Option<&str> {
        let raw = self.version.as_deref()?.trim();
        Some(raw.strip_prefix("===").or_else(|| raw.strip_prefix("==")).unwrap_or(raw).trim())
    }
}

/// One way a lock file disagrees with the manifest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockDrift {
    Missing {
        section: Section,
        package: String,
    },
    Unsatisfied {
        section: Section,
        package: String,
        constraint: String,
        locked: String,
    },
    InvalidPin {
        section: Section,
        package: String,
        version: String,
    },
    PythonMismatch {
        manifest: Option<String>,
        lock: Option<String>,
    },
}

impl fmt::Display for LockDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { section, package } => {
                write!(f, "[{section}] {package} is declared but not locked")
            }
            Self::Unsatisfied {
                section,
                package,
                constraint,
                locked,
            } => write!(
                f,
                "[{section}] {package} is locked at {locked}, which does not satisfy '{constraint}'"
            ),
            Self::InvalidPin {
                section,
                package,
                version,
            } => write!(
                f,
                "[{section}] {package} has an unparseable locked version '{version}'"
            ),
            Self::PythonMismatch { manifest, lock } => write!(
                f,
                "python_version is '{}' in the manifest but '{}' in the lock",
                manifest.as_deref().unwrap_or("(none)"),
                lock.as_deref().unwrap_or("(none)")
            ),
        }
    }
}

impl LockFile {
    pub fn parse_str(input: &str) -> Result<Self, LockError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Hash the resolver recorded for the manifest it locked, if any.
    pub fn manifest_hash(&self) -> Option<&str> {
        self.meta.hash.get("sha256").map(String::as_str)
    }

    pub fn python_version(&self) -> Option<&str> {
        self.meta.requires.get("python_version").map(String::as_str)
    }

    fn locked_section(&self, section: Section) -> BTreeMap<CanonicalName, &LockedPackage> {
        let table = match section {
            Section::DevPackages => &self.develop,
            _ => &self.default,
        };
        table
            .iter()
            .map(|(name, pkg)| (CanonicalName::from_raw(name), pkg))
            .collect()
    }

    /// Every disagreement between this lock and the manifest's declared intent.
    ///
    /// Packages present in the lock but absent from the manifest are
    /// transitive dependencies and are not reported.
    pub fn drift(&self, normalized: &NormalizedPipfile) -> Vec<LockDrift> {
        let mut out = Vec::new();

        let lock_python = self.python_version().map(str::to_owned);
        if normalized.python_version != lock_python {
            out.push(LockDrift::PythonMismatch {
                manifest: normalized.python_version.clone(),
                lock: lock_python,
            });
        }

        for section in [Section::Packages, Section::DevPackages] {
            let locked = self.locked_section(section);
            for pkg in normalized.section(section) {
                if let Some(drift) = check_package(section, pkg, locked.get(&pkg.name).copied()) {
                    out.push(drift);
                }
            }
        }
        debug!("lock drift check found {} issue(s)", out.len());
        out
    }

    /// Check that a manifest's declared intent matches this lock file.
    ///
    /// This catches cases where the manifest changed but the lock wasn't updated.
    pub fn verify_manifest_intent(&self, normalized: &NormalizedPipfile) -> Result<(), LockError> {
        let drift = self.drift(normalized);
        if drift.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = drift.iter().map(ToString::to_string).collect();
        Err(LockError::ManifestDrift(messages.join("; ")))
    }
}

fn check_package(
    section: Section,
    pkg: &NormalizedPackage,
    locked: Option<&LockedPackage>,
) -> Option<LockDrift> {
    let Some(locked) = locked else {
        return Some(LockDrift::Missing {
            section,
            package: pkg.name.to_string(),
        });
    };
    // VCS or path requirements and `*` only need to be present.
    if pkg.is_vcs_or_path() || pkg.constraint == VersionConstraint::Any {
        return None;
    }
    // Lock entries without a `version` (git or file pins) have nothing to compare.
    let pinned = locked.pinned_version()?;
    let Ok(version) = Version::parse(pinned) else {
        return Some(LockDrift::InvalidPin {
            section,
            package: pkg.name.to_string(),
            version: pinned.to_owned(),
        });
    };
    if pkg.constraint.matches(&version) {
        None
    } else {
        Some(LockDrift::Unsatisfied {
            section,
            package: pkg.name.to_string(),
            constraint: pkg.constraint.to_string(),
            locked: version.to_string(),
        })
    }
}
