//! Verification orchestration
//!
//! The harness sequences one snapshot test invocation across its rendering
//! variants:
//!
//! 1. **Prepare**: attach the render source and capture one bitmap per
//!    variant, in declaration order. The attachment is a scoped acquisition:
//!    the source is detached when the guard drops, even if a later step
//!    fails mid-variant.
//! 2. **Record** or **Verify**: record mode saves a golden per variant and
//!    deliberately never reports a passing verification, so freshly captured
//!    baselines always get human review. Verify mode loads the golden,
//!    compares, and on any non-match renders the diff overlay and persists
//!    the three failure artifacts, then keeps going, so a single run
//!    reports every failing variant rather than just the first.
//! 3. **Finalize**: the consuming `record`/`verify` receivers make the
//!    finalized state terminal; a harness instance is not reused.
//!
//! The aggregate [`RunReport`] serializes with serde for the reporting
//! collaborator and offers one-line `PASS:`/`FAIL:` summaries for humans.

use crate::bitmap::Bitmap;
use crate::compare::{compare, ComparisonOutcome, ToleranceSpec};
use crate::config::SnapshotConfig;
use crate::diff::render_difference;
use crate::error::{RenderError, Result, StoreError};
use crate::identity::{resolve, SnapshotIdentity, TestContext, Variant};
use crate::store::{self, SnapshotKind};
use serde::Serialize;
use std::path::PathBuf;

/// The rendering collaborator.
///
/// Implementations own layout and view lifecycle entirely; the harness only
/// asks for one premultiplied bitmap per variant (carrying the scale it was
/// captured at) between an `attach`/`detach` pair.
pub trait RenderSource {
    /// Acquires the shared rendering surface for this invocation.
    fn attach(&mut self) -> std::result::Result<(), RenderError>;

    /// Renders one bitmap for the given variant.
    fn render(&mut self, variant: &Variant) -> std::result::Result<Bitmap, RenderError>;

    /// Releases the surface. Called exactly once after a successful
    /// `attach`, regardless of how the run ends.
    fn detach(&mut self);
}

/// Detaches the source when dropped, so one variant's teardown can never
/// leak into the next invocation's render.
struct AttachGuard<'a> {
    source: &'a mut dyn RenderSource,
}

impl<'a> AttachGuard<'a> {
    fn acquire(source: &'a mut dyn RenderSource) -> std::result::Result<Self, RenderError> {
        source.attach()?;
        Ok(Self { source })
    }

    fn render(&mut self, variant: &Variant) -> std::result::Result<Bitmap, RenderError> {
        self.source.render(variant)
    }
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        self.source.detach();
    }
}

/// Paths of the three diagnostic images persisted for a failing variant.
///
/// `diff` is absent when the overlay could not be rendered; the raw
/// mismatch is still reported in that case.
#[derive(Debug, Clone, Serialize)]
pub struct FailureArtifacts {
    pub reference: PathBuf,
    pub actual: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<PathBuf>,
}

/// How a single variant ended.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum VariantStatus {
    /// The rendered bitmap matched the golden within tolerance.
    Passed,
    /// Record mode captured a new golden at `path`.
    Recorded { path: PathBuf },
    /// The comparison failed; diagnostics were persisted.
    Mismatched {
        outcome: ComparisonOutcome,
        artifacts: FailureArtifacts,
    },
    /// No golden has been recorded yet for this identity.
    MissingBaseline { path: PathBuf },
    /// A golden exists but could not be read back as an image.
    BaselineUnreadable { path: PathBuf, reason: String },
}

/// Outcome of one variant within a run.
#[derive(Debug, Serialize)]
pub struct VariantReport {
    /// Variant tag, in declaration order.
    pub variant: String,
    /// Label combining test-case name and variant, for diagnostic grouping.
    pub activity_label: String,
    pub status: VariantStatus,
}

impl VariantReport {
    /// True only for a matching verification; recorded variants are
    /// deliberately not passes.
    pub fn passed(&self) -> bool {
        matches!(self.status, VariantStatus::Passed)
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        match &self.status {
            VariantStatus::Passed => format!("PASS: {}", self.activity_label),
            VariantStatus::Recorded { path } => {
                format!("RECORDED: {} -> {}", self.activity_label, path.display())
            }
            VariantStatus::Mismatched { outcome, .. } => {
                format!("FAIL: {} - {}", self.activity_label, outcome)
            }
            VariantStatus::MissingBaseline { path } => format!(
                "FAIL: {} - no baseline recorded at {} (run in record mode first)",
                self.activity_label,
                path.display()
            ),
            VariantStatus::BaselineUnreadable { path, reason } => format!(
                "FAIL: {} - baseline {} is unreadable: {}",
                self.activity_label,
                path.display(),
                reason
            ),
        }
    }
}

/// Which mode a run executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Record,
    Verify,
}

/// Aggregate result of one snapshot test invocation.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub suite: String,
    pub case: String,
    /// Per-variant outcomes, in declaration order.
    pub variants: Vec<VariantReport>,
}

impl RunReport {
    /// True iff this was a verification and every variant matched.
    ///
    /// A record-mode run never passes: newly captured baselines must be
    /// reviewed by a human before they count.
    pub fn all_passed(&self) -> bool {
        self.mode == RunMode::Verify && self.variants.iter().all(VariantReport::passed)
    }

    /// Number of variants that matched.
    pub fn passed_count(&self) -> usize {
        self.variants.iter().filter(|v| v.passed()).count()
    }

    /// Iterator over the variants that did not match.
    pub fn failed_variants(&self) -> impl Iterator<Item = &VariantReport> {
        self.variants.iter().filter(|v| !v.passed())
    }

    /// Multi-line human-readable summary.
    pub fn summary(&self) -> String {
        let header = match self.mode {
            RunMode::Record => format!(
                "Recorded {} variant(s) for {}::{} - not a passing verification\n",
                self.variants.len(),
                self.suite,
                self.case
            ),
            RunMode::Verify => format!(
                "Verified {}::{}: {}/{} variant(s) passed\n",
                self.suite,
                self.case,
                self.passed_count(),
                self.variants.len()
            ),
        };
        let mut summary = header;
        for variant in &self.variants {
            summary.push_str("  ");
            summary.push_str(&variant.summary());
            summary.push('\n');
        }
        summary
    }

    /// Serializes the report for the reporting collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Orchestrates one snapshot test invocation.
///
/// Build one harness per test case, configure the variant list and optional
/// qualifier, then call [`run`](Self::run), [`record`](Self::record) or
/// [`verify`](Self::verify); all three consume the harness.
pub struct SnapshotHarness {
    config: SnapshotConfig,
    context: TestContext,
    qualifier: Option<String>,
    variants: Vec<Variant>,
}

impl SnapshotHarness {
    /// Creates a harness for one test invocation with a single default
    /// appearance variant. Use [`with_variants`](Self::with_variants) for
    /// multi-theme runs.
    pub fn new(config: SnapshotConfig, context: TestContext) -> Self {
        Self {
            config,
            context,
            qualifier: None,
            variants: vec![Variant::default_appearance("light")],
        }
    }

    /// Sets a qualifier that disambiguates multiple snapshots taken by the
    /// same test case.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Replaces the variant list. Order is significant: artifacts and
    /// report entries follow it deterministically.
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    /// Records or verifies depending on the configured mode.
    pub fn run(
        self,
        source: &mut dyn RenderSource,
        tolerance: ToleranceSpec,
    ) -> Result<RunReport> {
        if self.config.is_record_mode() {
            self.record(source)
        } else {
            self.verify(source, tolerance)
        }
    }

    /// Captures and saves a golden per variant.
    ///
    /// The report never counts as a passing verification; a write failure
    /// aborts the run, since a record that silently did not persist would
    /// corrupt every future verification.
    pub fn record(self, source: &mut dyn RenderSource) -> Result<RunReport> {
        let prepared = self.prepare(source)?;

        let mut variants = Vec::with_capacity(prepared.len());
        for (variant, bitmap) in prepared {
            let identity = self.identity(&variant, bitmap.scale());
            let path = store::save(&bitmap, &identity, SnapshotKind::Golden)?;
            variants.push(VariantReport {
                variant: variant.tag().to_string(),
                activity_label: identity.activity_label(),
                status: VariantStatus::Recorded { path },
            });
        }

        Ok(self.finalize(RunMode::Record, variants))
    }

    /// Verifies every variant against its golden.
    ///
    /// Comparison failures and missing/unreadable baselines fail their
    /// variant but the run continues, so the report covers all variants.
    /// Persistence failures abort with an error.
    pub fn verify(
        self,
        source: &mut dyn RenderSource,
        tolerance: ToleranceSpec,
    ) -> Result<RunReport> {
        let prepared = self.prepare(source)?;

        let mut variants = Vec::with_capacity(prepared.len());
        for (variant, rendered) in prepared {
            let identity = self.identity(&variant, rendered.scale());
            let status = self.verify_variant(&identity, &rendered, tolerance)?;
            variants.push(VariantReport {
                variant: variant.tag().to_string(),
                activity_label: identity.activity_label(),
                status,
            });
        }

        Ok(self.finalize(RunMode::Verify, variants))
    }

    /// Attaches the source and renders one bitmap per variant, in order.
    /// The guard detaches the source on every exit path.
    fn prepare(&self, source: &mut dyn RenderSource) -> Result<Vec<(Variant, Bitmap)>> {
        let mut guard = AttachGuard::acquire(source)?;
        let mut prepared = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            let bitmap = guard.render(variant)?;
            prepared.push((variant.clone(), bitmap));
        }
        Ok(prepared)
    }

    fn verify_variant(
        &self,
        identity: &SnapshotIdentity,
        rendered: &Bitmap,
        tolerance: ToleranceSpec,
    ) -> Result<VariantStatus> {
        let golden = match store::load(identity) {
            Ok(golden) => golden,
            Err(StoreError::NotFound { path }) => {
                return Ok(VariantStatus::MissingBaseline { path });
            }
            Err(StoreError::Decode { path, reason }) => {
                return Ok(VariantStatus::BaselineUnreadable { path, reason });
            }
            Err(StoreError::Read { path, source }) => {
                return Ok(VariantStatus::BaselineUnreadable {
                    path,
                    reason: source.to_string(),
                });
            }
            Err(other) => return Err(other.into()),
        };

        let outcome = compare(&golden, rendered, tolerance);
        if outcome.is_match() {
            return Ok(VariantStatus::Passed);
        }

        // The diff overlay is best-effort: a surface failure must not mask
        // the real mismatch.
        let diff = match render_difference(&golden, rendered) {
            Ok(diff) => Some(diff),
            Err(err) => {
                log::warn!(
                    "diff overlay unavailable for {}: {err}",
                    identity.activity_label()
                );
                None
            }
        };

        let reference_path = store::save(&golden, identity, SnapshotKind::FailureReference)?;
        let actual_path = store::save(rendered, identity, SnapshotKind::FailureActual)?;
        let diff_path = match &diff {
            Some(diff) => Some(store::save(diff, identity, SnapshotKind::FailureDiff)?),
            None => None,
        };

        Ok(VariantStatus::Mismatched {
            outcome,
            artifacts: FailureArtifacts {
                reference: reference_path,
                actual: actual_path,
                diff: diff_path,
            },
        })
    }

    fn identity(&self, variant: &Variant, scale: f32) -> SnapshotIdentity {
        resolve(
            &self.config,
            &self.context,
            self.qualifier.as_deref(),
            scale,
            variant,
        )
    }

    fn finalize(&self, mode: RunMode, variants: Vec<VariantReport>) -> RunReport {
        RunReport {
            mode,
            suite: self.context.suite().to_string(),
            case: self.context.case().to_string(),
            variants,
        }
    }
}
