use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pipspec_schema::{
    compute_manifest_digest, get_preset, parse_manifest_str, Version, VersionConstraint,
};

fn data_science_manifest() -> &'static str {
    get_preset("data-science").unwrap().manifest
}

fn bench_parse_manifest(c: &mut Criterion) {
    let input = data_science_manifest();
    c.bench_function("parse_manifest_18pkg", |b| {
        b.iter(|| parse_manifest_str(black_box(input)).unwrap());
    });
}

fn bench_normalize_and_digest(c: &mut Criterion) {
    let manifest = parse_manifest_str(data_science_manifest()).unwrap();
    c.bench_function("normalize_and_digest_18pkg", |b| {
        b.iter(|| {
            let normalized = black_box(&manifest).normalize().unwrap();
            compute_manifest_digest(&normalized)
        });
    });
}

fn bench_constraint_matching(c: &mut Criterion) {
    let constraint = VersionConstraint::parse(">=1.16.4,<2,!=1.18.*").unwrap();
    let candidates: Vec<Version> = ["1.16.3", "1.16.4", "1.18.5", "1.19.5", "2.0.0rc1"]
        .iter()
        .map(|v| Version::parse(v).unwrap())
        .collect();
    c.bench_function("constraint_match_5_candidates", |b| {
        b.iter(|| {
            candidates
                .iter()
                .filter(|v| constraint.matches(black_box(v)))
                .count()
        });
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    let manifest = parse_manifest_str(data_science_manifest()).unwrap();
    c.bench_function("render_and_reparse_18pkg", |b| {
        b.iter(|| {
            let rendered = black_box(&manifest).to_toml_string();
            parse_manifest_str(&rendered).unwrap().entries()
        });
    });
}

criterion_group!(
    benches,
    bench_parse_manifest,
    bench_normalize_and_digest,
    bench_constraint_matching,
    bench_roundtrip
);
criterion_main!(benches);
