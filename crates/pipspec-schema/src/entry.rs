//! Order-independent view of a manifest as `(section, key, value)` triples.

use crate::manifest::Pipfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Manifest section. Variant order is the order sections are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Source,
    DevPackages,
    Packages,
    Requires,
    Scripts,
    Pipenv,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Source,
        Section::DevPackages,
        Section::Packages,
        Section::Requires,
        Section::Scripts,
        Section::Pipenv,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::DevPackages => "dev-packages",
            Self::Packages => "packages",
            Self::Requires => "requires",
            Self::Scripts => "scripts",
            Self::Pipenv => "pipenv",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('[').trim_end_matches(']');
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown section '{s}' (expected one of: {})",
                    Self::ALL.map(Section::as_str).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub section: Section,
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(section: Section, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            section,
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} = {}", self.section, self.key, self.value)
    }
}

impl Pipfile {
    /// Every declaration in the manifest as a triple.
    ///
    /// Sources are keyed `<name>.url` and `<name>.verify_ssl`. Pipenv flags
    /// appear only when enabled, since absent and `false` mean the same thing.
    pub fn entries(&self) -> BTreeSet<Entry> {
        let mut out = BTreeSet::new();
        for source in &self.sources {
            out.insert(Entry::new(
                Section::Source,
                format!("{}.url", source.name),
                source.url.clone(),
            ));
            out.insert(Entry::new(
                Section::Source,
                format!("{}.verify_ssl", source.name),
                source.verify_ssl.to_string(),
            ));
        }
        for (name, req) in &self.packages {
            out.insert(Entry::new(Section::Packages, name.clone(), req.entry_value()));
        }
        for (name, req) in &self.dev_packages {
            out.insert(Entry::new(
                Section::DevPackages,
                name.clone(),
                req.entry_value(),
            ));
        }
        if let Some(v) = &self.requires.python_version {
            out.insert(Entry::new(Section::Requires, "python_version", v.clone()));
        }
        if let Some(v) = &self.requires.python_full_version {
            out.insert(Entry::new(
                Section::Requires,
                "python_full_version",
                v.clone(),
            ));
        }
        for (name, command) in &self.scripts {
            out.insert(Entry::new(Section::Scripts, name.clone(), command.clone()));
        }
        for flag in self.pipenv.enabled_flags() {
            out.insert(Entry::new(Section::Pipenv, flag, "true"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest_str;

    const SAMPLE: &str = r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[dev-packages]

[packages]
numpy = ">=1.16.4"
pandas = "*"

[requires]
python_version = "3.8"
"#;

    #[test]
    fn runtime_dependency_triple() {
        let entries = parse_manifest_str(SAMPLE).unwrap().entries();
        assert!(entries.contains(&Entry::new(Section::Packages, "numpy", ">=1.16.4")));
        assert!(entries.contains(&Entry::new(Section::Packages, "pandas", "*")));
    }

    #[test]
    fn source_and_requires_triples() {
        let entries = parse_manifest_str(SAMPLE).unwrap().entries();
        assert!(entries.contains(&Entry::new(
            Section::Source,
            "pypi.url",
            "https://pypi.org/simple"
        )));
        assert!(entries.contains(&Entry::new(Section::Source, "pypi.verify_ssl", "true")));
        assert!(entries.contains(&Entry::new(Section::Requires, "python_version", "3.8")));
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn entry_set_ignores_declaration_order() {
        let a = parse_manifest_str("[packages]\nscipy = \"*\"\nnumpy = \"*\"\n").unwrap();
        let b = parse_manifest_str("[packages]\nnumpy = \"*\"\nscipy = \"*\"\n").unwrap();
        assert_eq!(a.entries(), b.entries());
    }

    #[test]
    fn section_from_str() {
        assert_eq!("packages".parse::<Section>().unwrap(), Section::Packages);
        assert_eq!("[dev-packages]".parse::<Section>().unwrap(), Section::DevPackages);
        assert!("tools".parse::<Section>().is_err());
    }

    #[test]
    fn entry_display() {
        let entry = Entry::new(Section::Packages, "numpy", ">=1.16.4");
        assert_eq!(entry.to_string(), "[packages] numpy = >=1.16.4");
    }
}
