//! Structural checks over a parsed manifest.
//!
//! Unlike [`Pipfile::normalize`], which stops at the first problem, the linter
//! walks the whole manifest and reports every issue it finds.

use crate::config::LintConfig;
use pipspec_schema::{
    is_valid_package_name, is_valid_python_full_version, is_valid_python_version, CanonicalName,
    Pipfile, Requirement, Section, VersionConstraint,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    EmptyName,
    InvalidName,
    InvalidConstraint,
    DuplicatePackage,
    InvalidPythonVersion,
    InvalidPythonFullVersion,
    PythonVersionMismatch,
    PythonVersionPolicy,
    EmptySourceName,
    DuplicateSource,
    InvalidSourceUrl,
    InsecureSource,
    UnknownIndex,
    NoSource,
    WildcardConstraint,
    DevOverlap,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyName => "empty-name",
            Self::InvalidName => "invalid-name",
            Self::InvalidConstraint => "invalid-constraint",
            Self::DuplicatePackage => "duplicate-package",
            Self::InvalidPythonVersion => "invalid-python-version",
            Self::InvalidPythonFullVersion => "invalid-python-full-version",
            Self::PythonVersionMismatch => "python-version-mismatch",
            Self::PythonVersionPolicy => "python-version-policy",
            Self::EmptySourceName => "empty-source-name",
            Self::DuplicateSource => "duplicate-source",
            Self::InvalidSourceUrl => "invalid-source-url",
            Self::InsecureSource => "insecure-source",
            Self::UnknownIndex => "unknown-index",
            Self::NoSource => "no-source",
            Self::WildcardConstraint => "wildcard-constraint",
            Self::DevOverlap => "dev-overlap",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub severity: Severity,
    pub section: Option<Section>,
    pub key: Option<String>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        match (&self.section, &self.key) {
            (Some(section), Some(key)) => write!(f, " [{section}] {key}")?,
            (Some(section), None) => write!(f, " [{section}]")?,
            _ => {}
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub issues: Vec<Issue>,
}

impl LintReport {
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    /// Whether the manifest passes: no errors, and no warnings in strict mode.
    pub fn passes(&self, strict: bool) -> bool {
        !self.has_errors() && !(strict && self.warnings() > 0)
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

struct Linter<'a> {
    config: &'a LintConfig,
    issues: Vec<Issue>,
}

impl Linter<'_> {
    fn push(
        &mut self,
        code: IssueCode,
        severity: Severity,
        section: Option<Section>,
        key: Option<&str>,
        message: String,
    ) {
        if self.config.is_ignored(code.as_str()) {
            return;
        }
        self.issues.push(Issue {
            code,
            severity,
            section,
            key: key.map(str::to_owned),
            message,
        });
    }

    fn error(&mut self, code: IssueCode, section: Section, key: Option<&str>, message: String) {
        self.push(code, Severity::Error, Some(section), key, message);
    }

    fn warn(&mut self, code: IssueCode, section: Section, key: Option<&str>, message: String) {
        self.push(code, Severity::Warning, Some(section), key, message);
    }

    fn sources(&mut self, pipfile: &Pipfile) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        if pipfile.sources.is_empty() {
            self.push(
                IssueCode::NoSource,
                Severity::Warning,
                None,
                None,
                "no [[source]] declared; the package manager will fall back to its default index"
                    .to_owned(),
            );
        }
        let insecure = if self.config.require_ssl {
            Severity::Error
        } else {
            Severity::Warning
        };
        for source in &pipfile.sources {
            let name = source.name.trim();
            if name.is_empty() {
                self.error(
                    IssueCode::EmptySourceName,
                    Section::Source,
                    None,
                    format!("source with url '{}' has an empty name", source.url),
                );
            } else if !names.insert(name.to_owned()) {
                self.error(
                    IssueCode::DuplicateSource,
                    Section::Source,
                    Some(name),
                    format!("source name '{name}' is declared more than once"),
                );
            }

            let url = source.url.trim();
            let key = Some(name).filter(|n| !n.is_empty());
            if url.starts_with("https://") {
                if !source.verify_ssl {
                    self.push(
                        IssueCode::InsecureSource,
                        insecure,
                        Some(Section::Source),
                        key,
                        "verify_ssl is disabled".to_owned(),
                    );
                }
            } else if url.starts_with("http://") {
                self.push(
                    IssueCode::InsecureSource,
                    insecure,
                    Some(Section::Source),
                    key,
                    format!("'{url}' is fetched over plain http"),
                );
            } else {
                self.error(
                    IssueCode::InvalidSourceUrl,
                    Section::Source,
                    key,
                    format!("'{url}' is not an http(s) URL"),
                );
            }
        }
        names
    }

    /// Checks one package section and returns its packages by canonical
    /// name, with the key as written and the parsed constraint.
    fn packages<'m>(
        &mut self,
        section: Section,
        packages: &'m BTreeMap<String, Requirement>,
        sources: &BTreeSet<String>,
    ) -> BTreeMap<CanonicalName, (&'m str, Option<VersionConstraint>)> {
        let mut seen: BTreeMap<CanonicalName, &str> = BTreeMap::new();
        let mut out = BTreeMap::new();

        for (raw, req) in packages {
            let raw = raw.as_str();
            let name = raw.trim();
            if name.is_empty() {
                self.error(
                    IssueCode::EmptyName,
                    section,
                    None,
                    "package name must not be empty".to_owned(),
                );
                continue;
            }
            if !is_valid_package_name(name) {
                self.error(
                    IssueCode::InvalidName,
                    section,
                    Some(raw),
                    format!("'{raw}' is not a valid distribution name"),
                );
            }

            let canonical = CanonicalName::from_raw(name);
            if let Some(first) = seen.insert(canonical.clone(), raw) {
                self.error(
                    IssueCode::DuplicatePackage,
                    section,
                    Some(raw),
                    format!("'{first}' and '{raw}' both normalize to '{canonical}'"),
                );
            }

            // VCS and path requirements are unconstrained unless they declare a version.
            let constraint = match (req.version_spec(), req.is_vcs_or_path()) {
                (None, true) => None,
                (spec, _) => self.constraint(section, raw, spec.unwrap_or("*")),
            };

            if let Some(index) = req.index() {
                if !sources.contains(index.trim()) {
                    self.error(
                        IssueCode::UnknownIndex,
                        section,
                        Some(raw),
                        format!("index '{index}' does not name a declared source"),
                    );
                }
            }

            out.insert(canonical, (raw, constraint));
        }
        out
    }

    fn constraint(&mut self, section: Section, raw: &str, spec: &str) -> Option<VersionConstraint> {
        match VersionConstraint::parse(spec) {
            Ok(constraint) => {
                if constraint.is_any() && !self.config.allow_wildcard {
                    self.warn(
                        IssueCode::WildcardConstraint,
                        section,
                        Some(raw),
                        "unconstrained version ('*')".to_owned(),
                    );
                }
                Some(constraint)
            }
            Err(e) => {
                self.error(IssueCode::InvalidConstraint, section, Some(raw), e.to_string());
                None
            }
        }
    }

    fn dev_overlap(
        &mut self,
        runtime: &BTreeMap<CanonicalName, (&str, Option<VersionConstraint>)>,
        dev: &BTreeMap<CanonicalName, (&str, Option<VersionConstraint>)>,
    ) {
        for (name, (dev_key, dev_constraint)) in dev {
            let Some((runtime_key, runtime_constraint)) = runtime.get(name) else {
                continue;
            };
            if let (Some(a), Some(b)) = (runtime_constraint, dev_constraint) {
                if a != b {
                    self.warn(
                        IssueCode::DevOverlap,
                        Section::DevPackages,
                        Some(*dev_key),
                        format!("constrained '{b}' here but '{a}' as '{runtime_key}' in [packages]"),
                    );
                }
            }
        }
    }

    fn requires(&mut self, pipfile: &Pipfile) {
        let python = pipfile.requires.python_version.as_deref().map(str::trim);
        let full = pipfile.requires.python_full_version.as_deref().map(str::trim);

        let python_ok = match python {
            Some(v) if !is_valid_python_version(v) => {
                self.error(
                    IssueCode::InvalidPythonVersion,
                    Section::Requires,
                    Some("python_version"),
                    format!("'{v}' does not match 'major.minor'"),
                );
                false
            }
            _ => true,
        };
        let full_ok = match full {
            Some(v) if !is_valid_python_full_version(v) => {
                self.error(
                    IssueCode::InvalidPythonFullVersion,
                    Section::Requires,
                    Some("python_full_version"),
                    format!("'{v}' does not match 'major.minor.patch'"),
                );
                false
            }
            _ => true,
        };
        if let (Some(short), Some(long), true, true) = (python, full, python_ok, full_ok) {
            if !long.starts_with(&format!("{short}.")) {
                self.error(
                    IssueCode::PythonVersionMismatch,
                    Section::Requires,
                    Some("python_full_version"),
                    format!("'{long}' is not a {short} release"),
                );
            }
        }

        if let Some(required) = self.config.python_version.clone() {
            if python != Some(required.as_str()) {
                self.error(
                    IssueCode::PythonVersionPolicy,
                    Section::Requires,
                    Some("python_version"),
                    format!(
                        "policy requires python {required}, manifest declares {}",
                        python.unwrap_or("none")
                    ),
                );
            }
        }
    }
}

/// Run every check against a parsed manifest.
pub fn lint(pipfile: &Pipfile, config: &LintConfig) -> LintReport {
    let mut linter = Linter {
        config,
        issues: Vec::new(),
    };
    let sources = linter.sources(pipfile);
    let runtime = linter.packages(Section::Packages, &pipfile.packages, &sources);
    let dev = linter.packages(Section::DevPackages, &pipfile.dev_packages, &sources);
    linter.dev_overlap(&runtime, &dev);
    linter.requires(pipfile);

    let mut issues = linter.issues;
    issues.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.section.cmp(&b.section))
            .then_with(|| a.key.cmp(&b.key))
    });
    debug!("lint finished with {} issue(s)", issues.len());
    LintReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipspec_schema::{get_preset, parse_manifest_str};

    fn lint_str(input: &str) -> LintReport {
        lint(&parse_manifest_str(input).unwrap(), &LintConfig::default())
    }

    const SOURCE: &str = r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true
"#;

    #[test]
    fn presets_are_clean() {
        for name in ["minimal", "data-science", "notebook"] {
            let report = lint_str(get_preset(name).unwrap().manifest);
            assert!(report.issues.is_empty(), "{name}: {:?}", report.issues);
            assert!(report.passes(true));
        }
    }

    #[test]
    fn flags_invalid_constraint() {
        let report = lint_str(&format!("{SOURCE}[packages]\nnumpy = \"1.16.4\"\nscipy = \"=>1\"\n"));
        assert_eq!(report.errors(), 2);
        assert!(report
            .issues
            .iter()
            .all(|i| i.code == IssueCode::InvalidConstraint));
        assert!(!report.passes(false));
    }

    #[test]
    fn flags_canonical_duplicates() {
        let report = lint_str(&format!("{SOURCE}[packages]\nFoo_Bar = \"*\"\nfoo-bar = \"*\"\n"));
        assert!(report.has_code(IssueCode::DuplicatePackage));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn flags_invalid_names() {
        let report = lint_str(&format!("{SOURCE}[packages]\n\"bad name\" = \"*\"\n\"\" = \"*\"\n"));
        assert!(report.has_code(IssueCode::InvalidName));
        assert!(report.has_code(IssueCode::EmptyName));
    }

    #[test]
    fn flags_python_versions() {
        let report = lint_str(&format!(
            "{SOURCE}[requires]\npython_version = \"3\"\npython_full_version = \"3.8\"\n"
        ));
        assert!(report.has_code(IssueCode::InvalidPythonVersion));
        assert!(report.has_code(IssueCode::InvalidPythonFullVersion));

        let report = lint_str(&format!(
            "{SOURCE}[requires]\npython_version = \"3.8\"\npython_full_version = \"3.9.1\"\n"
        ));
        assert!(report.has_code(IssueCode::PythonVersionMismatch));

        let report = lint_str(&format!(
            "{SOURCE}[requires]\npython_version = \"3.8\"\npython_full_version = \"3.8.10\"\n"
        ));
        assert!(report.issues.is_empty());
    }

    #[test]
    fn flags_source_problems() {
        let report = lint_str(
            r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = false

[[source]]
name = "pypi"
url = "http://mirror.example/simple"

[[source]]
name = ""
url = "ftp://old.example/simple"
"#,
        );
        assert!(report.has_code(IssueCode::DuplicateSource));
        assert!(report.has_code(IssueCode::EmptySourceName));
        assert!(report.has_code(IssueCode::InvalidSourceUrl));
        assert_eq!(
            report
                .issues
                .iter()
                .filter(|i| i.code == IssueCode::InsecureSource)
                .count(),
            2
        );
        assert!(report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::InsecureSource)
            .all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn require_ssl_escalates_insecure_sources() {
        let manifest =
            parse_manifest_str("[[source]]\nname = \"m\"\nurl = \"http://m.example\"\n").unwrap();
        let config = LintConfig {
            require_ssl: true,
            ..LintConfig::default()
        };
        let report = lint(&manifest, &config);
        assert!(report.has_errors());
    }

    #[test]
    fn warns_without_sources() {
        let report = lint_str("[packages]\nnumpy = \"*\"\n");
        assert!(report.has_code(IssueCode::NoSource));
        assert!(report.passes(false));
        assert!(!report.passes(true));
    }

    #[test]
    fn flags_unknown_index() {
        let report = lint_str(&format!(
            "{SOURCE}[packages]\nnumpy = {{version = \"*\", index = \"private\"}}\nscipy = {{version = \"*\", index = \"pypi\"}}\n"
        ));
        let unknown: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::UnknownIndex)
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].key.as_deref(), Some("numpy"));
    }

    #[test]
    fn wildcard_policy() {
        let manifest = parse_manifest_str(&format!("{SOURCE}[packages]\nvoila = \"*\"\n")).unwrap();
        assert!(lint(&manifest, &LintConfig::default()).issues.is_empty());

        let config = LintConfig {
            allow_wildcard: false,
            ..LintConfig::default()
        };
        let report = lint(&manifest, &config);
        assert!(report.has_code(IssueCode::WildcardConstraint));
        assert!(!report.has_errors());
    }

    #[test]
    fn warns_on_conflicting_dev_overlap() {
        let report = lint_str(&format!(
            "{SOURCE}[packages]\nnumpy = \">=1.16\"\n[dev-packages]\nNumPy = \">=1.18\"\npandas = \"*\"\n"
        ));
        assert!(report.has_code(IssueCode::DevOverlap));

        let report = lint_str(&format!(
            "{SOURCE}[packages]\nnumpy = \">=1.16\"\n[dev-packages]\nnumpy = \">= 1.16\"\n"
        ));
        assert!(!report.has_code(IssueCode::DevOverlap));
    }

    #[test]
    fn python_policy() {
        let manifest = parse_manifest_str(&format!(
            "{SOURCE}[requires]\npython_version = \"3.7\"\n"
        ))
        .unwrap();
        let config = LintConfig {
            python_version: Some("3.8".to_owned()),
            ..LintConfig::default()
        };
        let report = lint(&manifest, &config);
        assert!(report.has_code(IssueCode::PythonVersionPolicy));
    }

    #[test]
    fn ignored_codes_are_suppressed() {
        let manifest = parse_manifest_str("[packages]\nnumpy = \"*\"\n").unwrap();
        let config = LintConfig {
            ignore: vec!["no-source".to_owned()],
            ..LintConfig::default()
        };
        assert!(lint(&manifest, &config).issues.is_empty());
    }

    #[test]
    fn vcs_requirements_skip_constraint_checks() {
        let report = lint_str(&format!(
            "{SOURCE}[packages]\nmylib = {{git = \"https://example.com/mylib.git\", editable = true}}\n"
        ));
        assert!(report.issues.is_empty());
    }

    #[test]
    fn vcs_requirements_still_check_declared_versions() {
        let input = format!(
            "{SOURCE}[packages]\nmylib = {{git = \"https://example.com/mylib.git\", version = \"bogus\"}}\n"
        );
        let manifest = parse_manifest_str(&input).unwrap();
        let report = lint(&manifest, &LintConfig::default());
        assert!(report.has_code(IssueCode::InvalidConstraint));
        assert_eq!(report.issues[0].key.as_deref(), Some("mylib"));
        // lint and normalize agree on what a valid manifest is
        assert!(manifest.normalize().is_err());
    }

    #[test]
    fn dev_overlap_reports_key_as_written() {
        let report = lint_str(&format!(
            "{SOURCE}[packages]\nnumpy = \">=1.16\"\n[dev-packages]\nNumPy = \">=1.18\"\n"
        ));
        let overlap = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::DevOverlap)
            .unwrap();
        assert_eq!(overlap.key.as_deref(), Some("NumPy"));
        assert!(overlap.message.contains("'numpy' in [packages]"));
    }

    #[test]
    fn errors_sort_before_warnings() {
        let report = lint_str("[packages]\nnumpy = \"bogus\"\n");
        assert_eq!(report.issues[0].severity, Severity::Error);
        assert_eq!(report.issues.last().unwrap().code, IssueCode::NoSource);
    }

    #[test]
    fn issue_display() {
        let report = lint_str(&format!("{SOURCE}[packages]\nnumpy = \"1.0\"\n"));
        let text = report.issues[0].to_string();
        assert!(text.starts_with("error[invalid-constraint] [packages] numpy: "));
    }
}
