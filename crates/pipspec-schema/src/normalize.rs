use crate::constraint::VersionConstraint;
use crate::entry::Section;
use crate::manifest::{ManifestError, Pipfile, Requirement};
use crate::types::CanonicalName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("valid regex")
});
static PYTHON_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("valid regex"));
static PYTHON_FULL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

/// PEP 508 distribution name syntax.
pub fn is_valid_package_name(name: &str) -> bool {
    PACKAGE_NAME.is_match(name)
}

/// `major.minor`, e.g. `3.8`.
pub fn is_valid_python_version(version: &str) -> bool {
    PYTHON_VERSION.is_match(version)
}

/// `major.minor.patch`, e.g. `3.8.10`.
pub fn is_valid_python_full_version(version: &str) -> bool {
    PYTHON_FULL_VERSION.is_match(version)
}

/// Canonical, sorted, validated representation of a parsed Pipfile.
///
/// Package names are PEP 503 canonical, constraints are parsed and rendered
/// canonically, and sources are sorted by name. This is the input to digest
/// computation and lock verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedPipfile {
    pub sources: Vec<NormalizedSource>,
    pub packages: Vec<NormalizedPackage>,
    pub dev_packages: Vec<NormalizedPackage>,
    pub python_version: Option<String>,
    pub python_full_version: Option<String>,
    pub allow_prereleases: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedSource {
    pub name: String,
    pub url: String,
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedPackage {
    pub name: CanonicalName,
    pub constraint: VersionConstraint,
    pub extras: Vec<String>,
    pub markers: Option<String>,
    pub index: Option<String>,
    /// VCS URL (with `@ref`) or local path, for requirements not taken from an index.
    pub origin: Option<String>,
    pub editable: bool,
}

impl NormalizedPackage {
    pub fn is_vcs_or_path(&self) -> bool {
        self.origin.is_some()
    }
}

impl Pipfile {
    /// Normalize the manifest: validate names and constraints, canonicalize,
    /// sort, and reject packages that collide after canonicalization.
    pub fn normalize(&self) -> Result<NormalizedPipfile, ManifestError> {
        let python_version = normalize_optional(self.requires.python_version.as_deref());
        if let Some(v) = &python_version {
            if !is_valid_python_version(v) {
                return Err(ManifestError::InvalidPythonVersion(v.clone()));
            }
        }
        let python_full_version =
            normalize_optional(self.requires.python_full_version.as_deref());
        if let Some(v) = &python_full_version {
            if !is_valid_python_full_version(v) {
                return Err(ManifestError::InvalidPythonFullVersion(v.clone()));
            }
        }

        let mut sources: Vec<NormalizedSource> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let name = source.name.trim().to_owned();
            if name.is_empty() {
                return Err(ManifestError::EmptySourceName);
            }
            if sources.iter().any(|s| s.name == name) {
                return Err(ManifestError::DuplicateSource(name));
            }
            sources.push(NormalizedSource {
                name,
                url: source.url.trim().trim_end_matches('/').to_owned(),
                verify_ssl: source.verify_ssl,
            });
        }
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(NormalizedPipfile {
            sources,
            packages: normalize_packages(Section::Packages, &self.packages)?,
            dev_packages: normalize_packages(Section::DevPackages, &self.dev_packages)?,
            python_version,
            python_full_version,
            allow_prereleases: self.pipenv.allow_prereleases,
        })
    }
}

impl NormalizedPipfile {
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn section(&self, section: Section) -> &[NormalizedPackage] {
        match section {
            Section::DevPackages => &self.dev_packages,
            Section::Packages => &self.packages,
            _ => &[],
        }
    }
}

fn normalize_packages(
    section: Section,
    packages: &BTreeMap<String, Requirement>,
) -> Result<Vec<NormalizedPackage>, ManifestError> {
    let mut seen: BTreeMap<CanonicalName, &str> = BTreeMap::new();
    let mut out = Vec::with_capacity(packages.len());

    for (raw_name, req) in packages {
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(ManifestError::EmptyPackageName(section));
        }
        if !is_valid_package_name(trimmed) {
            return Err(ManifestError::InvalidPackageName {
                section,
                name: raw_name.clone(),
            });
        }
        let name = CanonicalName::from_raw(trimmed);
        if let Some(first) = seen.insert(name.clone(), raw_name) {
            return Err(ManifestError::DuplicatePackage {
                section,
                name: name.into_inner(),
                first: first.to_owned(),
                second: raw_name.clone(),
            });
        }
        out.push(normalize_requirement(section, raw_name, name, req)?);
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

fn normalize_requirement(
    section: Section,
    raw_name: &str,
    name: CanonicalName,
    req: &Requirement,
) -> Result<NormalizedPackage, ManifestError> {
    let constraint = match req.version_spec() {
        Some(spec) => {
            VersionConstraint::parse(spec).map_err(|source| ManifestError::InvalidConstraint {
                section,
                package: raw_name.to_owned(),
                source,
            })?
        }
        None => VersionConstraint::Any,
    };

    let package = match req {
        Requirement::Version(_) => NormalizedPackage {
            name,
            constraint,
            extras: Vec::new(),
            markers: None,
            index: None,
            origin: None,
            editable: false,
        },
        Requirement::Detailed(d) => {
            let mut extras: Vec<String> = d
                .extras
                .iter()
                .map(|e| CanonicalName::from_raw(e).into_inner())
                .filter(|e| !e.is_empty())
                .collect();
            extras.sort();
            extras.dedup();
            let origin = match (&d.git, &d.path) {
                (Some(git), _) => Some(match &d.reference {
                    Some(r) => format!("{}@{}", git.trim(), r.trim()),
                    None => git.trim().to_owned(),
                }),
                (None, Some(path)) => Some(path.trim().to_owned()),
                (None, None) => None,
            };
            NormalizedPackage {
                name,
                constraint,
                extras,
                markers: normalize_optional(d.markers.as_deref()),
                index: normalize_optional(d.index.as_deref()),
                origin,
                editable: d.editable,
            }
        }
    };
    Ok(package)
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
