//! Snapshot identity resolution
//!
//! A snapshot's identity pins down exactly one canonical file name from the
//! test context plus the render variant. The filename algorithm must be
//! reproducible to the byte: identical inputs always resolve identically,
//! and distinct `(qualifier, variant, scale)` tuples never collide for the
//! same test case: a collision would silently overwrite an unrelated
//! golden image.
//!
//! Filename shape: `<case>[_<qualifier>][_<variant>]@<round(scale)>x.png`,
//! with every run of whitespace or punctuation collapsed to one underscore.

use crate::config::SnapshotConfig;
use crate::error::ConfigError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The test invocation a snapshot belongs to, passed explicitly by the
/// caller instead of being looked up from runner internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    suite: String,
    case: String,
}

impl TestContext {
    /// Builds a context from the suite (test-class) and case (test-method)
    /// names. Either being empty is a configuration error: without them no
    /// canonical path can exist.
    pub fn new(suite: impl Into<String>, case: impl Into<String>) -> Result<Self, ConfigError> {
        let suite = suite.into();
        let case = case.into();
        if suite.is_empty() {
            return Err(ConfigError::EmptyTestContext { field: "suite" });
        }
        if case.is_empty() {
            return Err(ConfigError::EmptyTestContext { field: "case" });
        }
        Ok(Self { suite, case })
    }

    /// Test-suite name; becomes the per-suite directory.
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Test-case name; seeds the canonical filename.
    pub fn case(&self) -> &str {
        &self.case
    }
}

/// A named rendering condition (e.g. a theme).
///
/// Variants form an open tag set. The designated default appearance
/// contributes no filename suffix, matching the convention that baseline
/// images carry the bare case name; every other variant appends `_<tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    tag: String,
    default_appearance: bool,
}

impl Variant {
    /// A non-default variant whose tag is appended to the filename.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            default_appearance: false,
        }
    }

    /// The default appearance; resolves without a filename suffix.
    pub fn default_appearance(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            default_appearance: true,
        }
    }

    /// The variant tag, used in labels and non-default filenames.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// True when this is the default appearance.
    pub fn is_default_appearance(&self) -> bool {
        self.default_appearance
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Canonical, collision-resistant identity of one stored snapshot.
///
/// Two identities are equal iff all fields are equal; an identity maps to
/// exactly one file name (and, through the store, one path per
/// [`SnapshotKind`](crate::store::SnapshotKind)).
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotIdentity {
    root: PathBuf,
    suite: String,
    case: String,
    qualifier: Option<String>,
    scale: f32,
    variant: Variant,
}

impl SnapshotIdentity {
    /// Artifact root the store resolves under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Suite directory name.
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Test-case name.
    pub fn case(&self) -> &str {
        &self.case
    }

    /// Optional caller-supplied qualifier.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Device scale the snapshot was captured at.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// The render variant this identity belongs to.
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Human-readable label combining case name and variant, used to group
    /// diagnostic output for the reporting collaborator.
    pub fn activity_label(&self) -> String {
        format!("{} ({})", self.case, self.variant.tag())
    }

    /// The canonical file name, extension included.
    pub fn file_name(&self) -> String {
        let mut raw = self.case.clone();
        if let Some(qualifier) = self.qualifier.as_deref() {
            if !qualifier.is_empty() {
                raw.push('_');
                raw.push_str(qualifier);
            }
        }
        if !self.variant.is_default_appearance() {
            raw.push('_');
            raw.push_str(self.variant.tag());
        }

        let mut name = sanitize(&raw);
        name.push_str(&format!("@{}x", self.scale.round() as i64));
        name.push_str(".png");
        name
    }
}

/// Resolves the canonical identity for one rendered variant.
///
/// The ambient inputs that could be absent (root path, active test case)
/// are validated where they are produced, in [`SnapshotConfig`] and
/// [`TestContext`] construction, so resolution itself is total.
pub fn resolve(
    config: &SnapshotConfig,
    context: &TestContext,
    qualifier: Option<&str>,
    scale: f32,
    variant: &Variant,
) -> SnapshotIdentity {
    SnapshotIdentity {
        root: config.root().to_path_buf(),
        suite: context.suite().to_string(),
        case: context.case().to_string(),
        qualifier: qualifier.filter(|q| !q.is_empty()).map(str::to_string),
        scale,
        variant: variant.clone(),
    }
}

/// Collapses every run of whitespace or punctuation into one underscore.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if ch.is_whitespace() || ch.is_ascii_punctuation() {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
