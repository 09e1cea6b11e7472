use pipspec_core::{diff_manifests, lint, Engine, IssueCode, LintConfig};
use pipspec_schema::{
    get_preset, parse_manifest_str, Entry, LockDrift, Operator, Section, VersionConstraint,
};
use std::fs;
use std::path::{Path, PathBuf};

fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("Pipfile");
    fs::write(&path, content).unwrap();
    path
}

fn data_science() -> &'static str {
    get_preset("data-science").unwrap().manifest
}

#[test]
fn data_science_manifest_is_well_formed() {
    let manifest = parse_manifest_str(data_science()).unwrap();
    let report = lint(&manifest, &LintConfig::default());
    assert!(report.issues.is_empty(), "{:?}", report.issues);

    assert!(manifest
        .entries()
        .contains(&Entry::new(Section::Packages, "numpy", ">=1.16.4")));
    let numpy = VersionConstraint::parse(
        manifest.packages["numpy"].version_spec().unwrap(),
    )
    .unwrap();
    assert_eq!(numpy.clauses().len(), 1);
    assert_eq!(numpy.clauses()[0].operator, Operator::GreaterEqual);
    assert_eq!(numpy.clauses()[0].version_text(), "1.16.4");
}

#[test]
fn rendering_preserves_every_entry() {
    let inputs = [
        data_science(),
        get_preset("notebook").unwrap().manifest,
        r#"
[packages]
"zope.interface" = "*"
requests = {version = ">=2.0", extras = ["socks", "security"]}
mylib = {git = "https://example.com/mylib.git", ref = "v1.2", editable = true}

[dev-packages]
pytest = "~=6.2"

[scripts]
"test:all" = "pytest -q"

[pipenv]
allow_prereleases = true
"#,
    ];
    for input in inputs {
        let first = parse_manifest_str(input).unwrap();
        let rendered = first.to_toml_string();
        let second = parse_manifest_str(&rendered).unwrap();
        assert_eq!(first.entries(), second.entries(), "rendered:\n{rendered}");
        assert!(!diff_manifests(&first, &second).has_changes);
        assert_eq!(second.to_toml_string(), rendered);
    }
}

#[test]
fn engine_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), data_science());
    let engine = Engine::new(LintConfig {
        python_version: Some("3.8".to_owned()),
        ..LintConfig::default()
    });

    let checked = engine.check(&manifest).unwrap();
    assert!(checked.report.passes(true));

    let identity = engine.digest(&manifest).unwrap();
    assert_eq!(identity.digest.len(), 64);
    assert!(identity.digest.starts_with(identity.short.as_str()));

    // Reordering and respelling does not change the digest.
    let rewritten = data_science()
        .replace("numpy = \">=1.16.4\"", "NumPy = \">= 1.16.4\"")
        .replace("scipy = \"*\"\n", "");
    let rewritten = rewritten.replace("[packages]\n", "[packages]\nscipy = \"*\"\n");
    write_manifest(dir.path(), &rewritten);
    assert_eq!(engine.digest(&manifest).unwrap(), identity);
}

#[test]
fn lock_drift_is_reported_per_package() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        "[[source]]\nname = \"pypi\"\nurl = \"https://pypi.org/simple\"\n\n[packages]\nnumpy = \">=1.16.4\"\npandas = \">=0.25.0\"\nxlrd = \"*\"\n\n[dev-packages]\npytest = \">=6\"\n\n[requires]\npython_version = \"3.8\"\n",
    );
    fs::write(
        dir.path().join("Pipfile.lock"),
        r#"{
    "_meta": {"requires": {"python_version": "3.7"}},
    "default": {
        "numpy": {"version": "==1.15.0"},
        "pandas": {"version": "==not-a-version"}
    },
    "develop": {"pytest": {"version": "==6.2.5"}}
}"#,
    )
    .unwrap();

    let result = Engine::new(LintConfig::default())
        .verify_lock(&manifest, None)
        .unwrap();
    assert_eq!(result.drift.len(), 4, "{:?}", result.drift);
    assert!(result
        .drift
        .iter()
        .any(|d| matches!(d, LockDrift::PythonMismatch { .. })));
    assert!(result
        .drift
        .iter()
        .any(|d| matches!(d, LockDrift::Unsatisfied { package, .. } if package == "numpy")));
    assert!(result
        .drift
        .iter()
        .any(|d| matches!(d, LockDrift::InvalidPin { package, .. } if package == "pandas")));
    assert!(result
        .drift
        .iter()
        .any(|d| matches!(d, LockDrift::Missing { package, .. } if package == "xlrd")));
}

#[test]
fn lint_collects_all_issues_where_normalize_stops() {
    let manifest = parse_manifest_str(
        "[packages]\nnumpy = \"1.16\"\nscipy = \">=\"\n\n[requires]\npython_version = \"three\"\n",
    )
    .unwrap();
    assert!(manifest.normalize().is_err());

    let report = lint(&manifest, &LintConfig::default());
    assert_eq!(
        report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::InvalidConstraint)
            .count(),
        2
    );
    assert!(report.has_code(IssueCode::InvalidPythonVersion));
    assert!(report.has_code(IssueCode::NoSource));
}
