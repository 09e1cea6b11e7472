//! Pipfile parsing, version constraints, normalization, and lock files for pipspec.
//!
//! This crate defines the schema layer: TOML manifest parsing (`Pipfile`),
//! the PEP 440 version and constraint grammar (`Version`, `VersionConstraint`),
//! the order-independent triple view (`Entry`), canonical rendering,
//! normalized representations (`NormalizedPipfile`), deterministic manifest
//! digests (`compute_manifest_digest`), lock file drift checks (`LockFile`),
//! and built-in preset manifests.

pub mod constraint;
pub mod entry;
pub mod identity;
pub mod lock;
pub mod manifest;
pub mod normalize;
pub mod preset;
pub mod render;
pub mod types;
pub mod version;

pub use constraint::{Clause, ConstraintError, Operator, Target, VersionConstraint};
pub use entry::{Entry, Section};
pub use identity::{compute_manifest_digest, ManifestIdentity};
pub use lock::{LockDrift, LockError, LockFile, LockedPackage};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, DetailedRequirement, ManifestError, PipenvSection,
    Pipfile, Requirement, RequiresSection, SourceSection,
};
pub use normalize::{
    is_valid_package_name, is_valid_python_full_version, is_valid_python_version,
    NormalizedPackage, NormalizedPipfile, NormalizedSource,
};
pub use preset::{get_preset, list_presets, Preset, BUILTIN_PRESETS};
pub use render::render_pipfile;
pub use types::{CanonicalName, ManifestDigest, ShortDigest};
pub use version::{LocalSegment, PreKind, Version, VersionError};
