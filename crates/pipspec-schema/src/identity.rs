use crate::normalize::{NormalizedPackage, NormalizedPipfile};
use crate::types::{ManifestDigest, ShortDigest};
use serde::Serialize;

/// Deterministic fingerprint of a manifest's declared intent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestIdentity {
    pub digest: ManifestDigest,
    pub short: ShortDigest,
}

/// Compute the digest of a normalized manifest.
///
/// Only normalized data is hashed, so manifests that differ in declaration
/// order, name spelling (`Foo_Bar` vs `foo-bar`), or constraint whitespace
/// share a digest. Scripts are not part of the dependency intent and are
/// left out.
pub fn compute_manifest_digest(normalized: &NormalizedPipfile) -> ManifestIdentity {
    let mut hasher = blake3::Hasher::new();

    for source in &normalized.sources {
        hasher.update(
            format!(
                "source:{}:{}:{}\n",
                source.name, source.url, source.verify_ssl
            )
            .as_bytes(),
        );
    }
    for pkg in &normalized.packages {
        hash_package(&mut hasher, "pkg", pkg);
    }
    for pkg in &normalized.dev_packages {
        hash_package(&mut hasher, "dev", pkg);
    }
    if let Some(v) = &normalized.python_version {
        hasher.update(format!("python:{v}\n").as_bytes());
    }
    if let Some(v) = &normalized.python_full_version {
        hasher.update(format!("python_full:{v}\n").as_bytes());
    }
    if normalized.allow_prereleases {
        hasher.update(b"prereleases\n");
    }

    let hex = hasher.finalize().to_hex().to_string();
    let short = hex[..12].to_owned();

    ManifestIdentity {
        digest: ManifestDigest::new(hex),
        short: ShortDigest::new(short),
    }
}

fn hash_package(hasher: &mut blake3::Hasher, tag: &str, pkg: &NormalizedPackage) {
    hasher.update(
        format!(
            "{tag}:{}:{}:[{}]:{}:{}:{}:{}\n",
            pkg.name,
            pkg.constraint,
            pkg.extras.join(","),
            pkg.markers.as_deref().unwrap_or(""),
            pkg.index.as_deref().unwrap_or(""),
            pkg.origin.as_deref().unwrap_or(""),
            pkg.editable,
        )
        .as_bytes(),
    );
}
