//! snapcheck: golden-image snapshot regression testing
//!
//! Given a rendered RGBA bitmap of a UI element and a previously recorded
//! reference bitmap, snapcheck decides whether the two are "close enough"
//! under a configurable two-level tolerance, and manages the on-disk
//! lifecycle of reference and failure-diagnostic images.
//!
//! # Pipeline
//!
//! 1. **Render**: a [`RenderSource`] produces one premultiplied bitmap per
//!    requested [`Variant`] (e.g. one per theme)
//! 2. **Resolve**: test context + variant → canonical snapshot identity
//! 3. **Record** or **Compare**: save new goldens, or compare against the
//!    stored baseline under a [`ToleranceSpec`]
//! 4. **Diagnose**: failing variants get a difference overlay plus the
//!    reference/actual/diff artifact trio on disk
//! 5. **Report**: a serializable [`RunReport`] goes to the test runner
//!
//! The whole pipeline is synchronous and runs once per test-case execution;
//! the comparator and diff renderer are pure and safe to use on independent
//! bitmap pairs concurrently.

pub mod bitmap;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod harness;
pub mod identity;
pub mod store;

pub use bitmap::Bitmap;
pub use compare::{compare, ComparisonOutcome, ToleranceSpec};
pub use config::SnapshotConfig;
pub use diff::render_difference;
pub use error::{Error, Result};
pub use harness::{
    FailureArtifacts, RenderSource, RunMode, RunReport, SnapshotHarness, VariantReport,
    VariantStatus,
};
pub use identity::{SnapshotIdentity, TestContext, Variant};
pub use store::SnapshotKind;
