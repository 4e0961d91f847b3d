//! Error types for snapcheck
//!
//! Each subsystem gets its own error enum:
//! - Configuration errors (root path, test context)
//! - Comparison errors (tolerance validation)
//! - Store errors (loading, decoding, persisting snapshots)
//! - Render errors (diff-surface acquisition, render-source failures)
//!
//! All errors use the `thiserror` crate and carry enough structured context
//! (paths, dimensions, values) to produce an actionable message without any
//! logging side effects. Nothing in this crate retries a failed operation;
//! every operation is safe to re-run from the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for snapcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for snapcheck.
///
/// Each variant wraps a more specific error type for that subsystem.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid ambient configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid bitmap construction
    #[error("Bitmap error: {0}")]
    Bitmap(#[from] BitmapError),

    /// Invalid comparison parameters
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    /// Snapshot loading or persistence error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Diff rendering or render-source error
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors raised while resolving ambient configuration.
///
/// These are always fatal to the current test and are never retried.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// The artifact root path is not available from the process environment
    #[error("environment variable `{var}` with the snapshot root path is not set")]
    RootPathNotSet { var: &'static str },

    /// The resolved root path is empty
    #[error("environment variable `{var}` is set but empty")]
    EmptyRootPath { var: &'static str },

    /// A test-context field required for identity resolution is empty
    #[error("test context field `{field}` is empty")]
    EmptyTestContext { field: &'static str },
}

/// Errors raised while constructing a [`Bitmap`](crate::Bitmap).
#[derive(Error, Debug, Clone)]
pub enum BitmapError {
    /// Row stride is too small to hold a row of pixels
    #[error("stride {stride} is smaller than {width} pixels * 4 bytes")]
    StrideTooSmall { stride: usize, width: u32 },

    /// Buffer length does not match `stride * height`
    #[error("buffer holds {actual} bytes, expected {expected} (stride {stride} * height {height})")]
    BufferSizeMismatch {
        expected: usize,
        actual: usize,
        stride: usize,
        height: u32,
    },

    /// The pixel count or byte size overflows the address space
    #[error("bitmap dimensions overflow: {width}x{height}")]
    DimensionsOverflow { width: u32, height: u32 },
}

/// Errors raised while validating comparison parameters.
#[derive(Error, Debug, Clone)]
pub enum CompareError {
    /// A tolerance value is outside the `[0, 1]` range
    #[error("tolerance `{name}` must be within [0, 1], got {value}")]
    ToleranceOutOfRange { name: &'static str, value: f64 },
}

/// Errors raised by the snapshot store.
///
/// `NotFound` and `Decode` are fatal to the current variant's verification
/// (a missing baseline is actionable differently from a changed one);
/// write-side failures are fatal to the whole run, since a record that
/// silently did not persist would corrupt future verifications.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No golden snapshot has been recorded at the resolved path
    #[error("no recorded snapshot found at '{}'", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read
    #[error("failed to read snapshot '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but is not a decodable PNG
    #[error("failed to decode snapshot '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The bitmap could not be encoded as PNG
    #[error("failed to encode snapshot for '{}': {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    /// An intermediate directory could not be created
    #[error("failed to create snapshot directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The snapshot bytes could not be persisted at the final path
    #[error("failed to write snapshot '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors raised while rendering.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// The drawing surface for the diff overlay could not be acquired.
    ///
    /// This is a resource condition, not a data condition; callers degrade
    /// gracefully by reporting the raw mismatch without a diff artifact.
    #[error("failed to acquire a {width}x{height} drawing surface")]
    SurfaceUnavailable { width: u32, height: u32 },

    /// The rendering collaborator failed to produce a bitmap
    #[error("render source failed: {reason}")]
    SourceFailed { reason: String },
}
