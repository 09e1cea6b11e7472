use crate::CoreError;
use pipspec_schema::{parse_manifest_file, Entry, Pipfile, Section};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A key whose value differs between two manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedEntry {
    pub section: Section,
    pub key: String,
    pub old: String,
    pub new: String,
}

/// Differences between two manifests, computed over their entry triples.
#[derive(Debug, Serialize)]
pub struct ManifestDiff {
    pub added: Vec<Entry>,
    pub removed: Vec<Entry>,
    pub changed: Vec<ChangedEntry>,
    pub has_changes: bool,
}

/// Compare two manifests. Declaration order never produces a difference.
pub fn diff_manifests(old: &Pipfile, new: &Pipfile) -> ManifestDiff {
    let index = |p: &Pipfile| -> BTreeMap<(Section, String), String> {
        p.entries()
            .into_iter()
            .map(|e| ((e.section, e.key), e.value))
            .collect()
    };
    let old_map = index(old);
    let new_map = index(new);

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut changed = Vec::new();

    for ((section, key), old_value) in &old_map {
        match new_map.get(&(*section, key.clone())) {
            None => removed.push(Entry::new(*section, key.clone(), old_value.clone())),
            Some(new_value) if new_value != old_value => changed.push(ChangedEntry {
                section: *section,
                key: key.clone(),
                old: old_value.clone(),
                new: new_value.clone(),
            }),
            Some(_) => {}
        }
    }
    for ((section, key), new_value) in &new_map {
        if !old_map.contains_key(&(*section, key.clone())) {
            added.push(Entry::new(*section, key.clone(), new_value.clone()));
        }
    }

    let has_changes = !added.is_empty() || !removed.is_empty() || !changed.is_empty();
    ManifestDiff {
        added,
        removed,
        changed,
        has_changes,
    }
}

pub fn diff_files(old: &Path, new: &Path) -> Result<ManifestDiff, CoreError> {
    let old_manifest = parse_manifest_file(old)?;
    let new_manifest = parse_manifest_file(new)?;
    Ok(diff_manifests(&old_manifest, &new_manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipspec_schema::parse_manifest_str;

    #[test]
    fn identical_manifests_have_no_changes() {
        let a = parse_manifest_str("[packages]\nnumpy = \"*\"\nscipy = \"*\"\n").unwrap();
        let b = parse_manifest_str("[packages]\nscipy = \"*\"\nnumpy = \"*\"\n").unwrap();
        let diff = diff_manifests(&a, &b);
        assert!(!diff.has_changes);
    }

    #[test]
    fn detects_added_removed_and_changed() {
        let old = parse_manifest_str(
            "[packages]\nnumpy = \">=1.16.4\"\nxlrd = \"*\"\n[requires]\npython_version = \"3.8\"\n",
        )
        .unwrap();
        let new = parse_manifest_str(
            "[packages]\nnumpy = \">=1.19\"\nopenpyxl = \"*\"\n[requires]\npython_version = \"3.8\"\n",
        )
        .unwrap();
        let diff = diff_manifests(&old, &new);
        assert!(diff.has_changes);
        assert_eq!(
            diff.added,
            vec![Entry::new(Section::Packages, "openpyxl", "*")]
        );
        assert_eq!(diff.removed, vec![Entry::new(Section::Packages, "xlrd", "*")]);
        assert_eq!(
            diff.changed,
            vec![ChangedEntry {
                section: Section::Packages,
                key: "numpy".to_owned(),
                old: ">=1.16.4".to_owned(),
                new: ">=1.19".to_owned(),
            }]
        );
    }

    #[test]
    fn moving_between_sections_is_add_plus_remove() {
        let old = parse_manifest_str("[packages]\npytest = \"*\"\n").unwrap();
        let new = parse_manifest_str("[dev-packages]\npytest = \"*\"\n").unwrap();
        let diff = diff_manifests(&old, &new);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn diff_files_reads_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.toml");
        let new = dir.path().join("new.toml");
        std::fs::write(&old, "[packages]\nbqplot = \"*\"\n").unwrap();
        std::fs::write(&new, "[packages]\nbqplot = \">=0.12\"\n").unwrap();
        let diff = diff_files(&old, &new).unwrap();
        assert_eq!(diff.changed.len(), 1);

        let missing = diff_files(&old, &dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(CoreError::Manifest(_))));
    }
}
