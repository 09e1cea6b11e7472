use crate::constraint::ConstraintError;
use crate::entry::Section;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("package name must not be empty in [{0}]")]
    EmptyPackageName(Section),
    #[error("invalid package name '{name}' in [{section}]")]
    InvalidPackageName { section: Section, name: String },
    #[error("duplicate package in [{section}]: '{first}' and '{second}' both normalize to '{name}'")]
    DuplicatePackage {
        section: Section,
        name: String,
        first: String,
        second: String,
    },
    #[error("invalid version constraint for '{package}' in [{section}]: {source}")]
    InvalidConstraint {
        section: Section,
        package: String,
        #[source]
        source: ConstraintError,
    },
    #[error("requires.python_version must look like 'major.minor', got '{0}'")]
    InvalidPythonVersion(String),
    #[error("requires.python_full_version must look like 'major.minor.patch', got '{0}'")]
    InvalidPythonFullVersion(String),
    #[error("source name must not be empty")]
    EmptySourceName,
    #[error("duplicate source name '{0}'")]
    DuplicateSource(String),
}

/// A Pipfile: package indexes, runtime and development dependencies, and
/// interpreter requirements.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Pipfile {
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceSection>,
    #[serde(default)]
    pub packages: BTreeMap<String, Requirement>,
    #[serde(default, rename = "dev-packages")]
    pub dev_packages: BTreeMap<String, Requirement>,
    #[serde(default)]
    pub requires: RequiresSection,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub pipenv: PipenvSection,
}

/// A package index declared with `[[source]]`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub name: String,
    pub url: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequiresSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_full_version: Option<String>,
}

impl RequiresSection {
    pub fn is_empty(&self) -> bool {
        self.python_version.is_none() && self.python_full_version.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipenvSection {
    #[serde(default)]
    pub allow_prereleases: bool,
    #[serde(default)]
    pub disable_pip_input: bool,
    #[serde(default)]
    pub install_search_all_sources: bool,
}

impl PipenvSection {
    /// Flags that are switched on, by key.
    pub fn enabled_flags(&self) -> Vec<&'static str> {
        [
            ("allow_prereleases", self.allow_prereleases),
            ("disable_pip_input", self.disable_pip_input),
            ("install_search_all_sources", self.install_search_all_sources),
        ]
        .into_iter()
        .filter_map(|(key, on)| on.then_some(key))
        .collect()
    }
}

/// A dependency declaration: either a bare constraint string or an inline table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Requirement {
    Version(String),
    Detailed(DetailedRequirement),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DetailedRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
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
    #[serde(default, skip_serializing_if = "is_false")]
    pub editable: bool,
}

impl Requirement {
    /// The declared constraint text, if any. `None` means "unconstrained".
    pub fn version_spec(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v),
            Self::Detailed(d) => d.version.as_deref(),
        }
    }

    /// Requirements sourced from a VCS checkout or a local path carry no
    /// meaningful version constraint.
    pub fn is_vcs_or_path(&self) -> bool {
        matches!(self, Self::Detailed(d) if d.git.is_some() || d.path.is_some())
    }

    pub fn index(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(d) => d.index.as_deref(),
        }
    }

    /// Value used for this requirement in the manifest's entry triples.
    pub fn entry_value(&self) -> String {
        match self {
            Self::Version(v) => v.clone(),
            Self::Detailed(d) => crate::render::inline_table(d),
        }
    }
}

impl From<&str> for Requirement {
    fn from(s: &str) -> Self {
        Self::Version(s.to_owned())
    }
}

fn default_verify_ssl() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl Pipfile {
    /// Canonical Pipfile text for this manifest.
    pub fn to_toml_string(&self) -> String {
        crate::render::render_pipfile(self)
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Pipfile, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Pipfile, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let input = r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[dev-packages]
pytest = "*"

[packages]
numpy = ">=1.16.4"
requests = {version = ">=2.20", extras = ["socks"]}
mylib = {git = "https://example.com/mylib.git", ref = "main", editable = true}

[requires]
python_version = "3.8"

[scripts]
test = "pytest -q"

[pipenv]
allow_prereleases = true
"#;
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.sources.len(), 1);
        assert_eq!(manifest.sources[0].name, "pypi");
        assert_eq!(manifest.packages.len(), 3);
        assert_eq!(manifest.packages["numpy"], Requirement::from(">=1.16.4"));
        assert_eq!(manifest.packages["requests"].version_spec(), Some(">=2.20"));
        assert!(manifest.packages["mylib"].is_vcs_or_path());
        assert_eq!(manifest.dev_packages["pytest"].version_spec(), Some("*"));
        assert_eq!(manifest.requires.python_version.as_deref(), Some("3.8"));
        assert_eq!(manifest.scripts["test"], "pytest -q");
        assert!(manifest.pipenv.allow_prereleases);
        assert_eq!(manifest.pipenv.enabled_flags(), vec!["allow_prereleases"]);
    }

    #[test]
    fn parses_empty_manifest() {
        let manifest = parse_manifest_str("").expect("should parse");
        assert_eq!(manifest, Pipfile::default());
        assert!(manifest.requires.is_empty());
    }

    #[test]
    fn verify_ssl_defaults_to_true() {
        let manifest = parse_manifest_str(
            r#"
[[source]]
name = "internal"
url = "https://pypi.internal/simple"
"#,
        )
        .unwrap();
        assert!(manifest.sources[0].verify_ssl);
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(parse_manifest_str("[tools]\nfoo = \"bar\"\n").is_err());
    }

    #[test]
    fn rejects_unknown_requirement_keys() {
        let input = r#"
[packages]
numpy = {version = "*", colour = "blue"}
"#;
        assert!(parse_manifest_str(input).is_err());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let input = r#"
[packages]
numpy = "*"
numpy = ">=1.0"
"#;
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::ParseToml(_))
        ));
    }

    #[test]
    fn reads_manifest_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Pipfile");
        fs::write(&path, "[packages]\nscipy = \"*\"\n").unwrap();
        let manifest = parse_manifest_file(&path).unwrap();
        assert!(manifest.packages.contains_key("scipy"));

        let missing = parse_manifest_file(dir.path().join("absent"));
        assert!(matches!(missing, Err(ManifestError::Io(_))));
    }
}
