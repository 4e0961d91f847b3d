//! Snapshot persistence
//!
//! The store maps a [`SnapshotIdentity`] plus a [`SnapshotKind`] to exactly
//! one path and moves PNG bytes in and out of it. Golden baselines live in
//! a separate subtree from failure diagnostics so a failing run can never
//! overwrite an accepted baseline:
//!
//! ```text
//! <root>/UnitTests/ReferenceImages/<Suite>/<file>.png
//! <root>/UnitTests/FailureDiffs/<Suite>/{reference_,actual_,diff_}<file>.png
//! ```
//!
//! Writes are atomic (sibling temp file, then rename) so no partially
//! written file is ever observable at the final path. The store never
//! deletes anything; re-recording overwrites the golden in place.

use crate::bitmap::Bitmap;
use crate::error::StoreError;
use crate::identity::SnapshotIdentity;
use image::ImageFormat;
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

const UNIT_TESTS_DIR: &str = "UnitTests";
const REFERENCE_IMAGES_DIR: &str = "ReferenceImages";
const FAILURE_DIFFS_DIR: &str = "FailureDiffs";

/// What role a stored image plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// The accepted baseline a future render is compared against.
    Golden,
    /// On failure: the baseline that was compared against.
    FailureReference,
    /// On failure: the image the test actually produced.
    FailureActual,
    /// On failure: the rendered difference overlay.
    FailureDiff,
}

impl SnapshotKind {
    /// Filename prefix that keeps the three failure artifacts of one run
    /// from colliding with each other or with the golden file.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Golden => "",
            Self::FailureReference => "reference_",
            Self::FailureActual => "actual_",
            Self::FailureDiff => "diff_",
        }
    }

    /// True for the three failure-diagnostic kinds.
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Golden)
    }

    fn subtree(self) -> &'static str {
        match self {
            Self::Golden => REFERENCE_IMAGES_DIR,
            _ => FAILURE_DIFFS_DIR,
        }
    }
}

/// Resolves the canonical path for an identity and kind.
pub fn path(identity: &SnapshotIdentity, kind: SnapshotKind) -> PathBuf {
    identity
        .root()
        .join(UNIT_TESTS_DIR)
        .join(kind.subtree())
        .join(identity.suite())
        .join(format!("{}{}", kind.file_prefix(), identity.file_name()))
}

/// Loads the golden snapshot for an identity.
///
/// Distinguishes "no baseline recorded yet" ([`StoreError::NotFound`]) from
/// "baseline exists but is unreadable" ([`StoreError::Decode`]), since the
/// two are actionable differently.
pub fn load(identity: &SnapshotIdentity) -> Result<Bitmap, StoreError> {
    let path = path(identity, SnapshotKind::Golden);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound { path });
        }
        Err(source) => return Err(StoreError::Read { path, source }),
    };

    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| StoreError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?
        .to_rgba8();

    Ok(Bitmap::from_rgba_image(image, identity.scale()))
}

/// Persists a bitmap for an identity and kind, creating intermediate
/// directories as needed, and returns the path written.
///
/// The PNG encodes the premultiplied channel bytes verbatim, so loading the
/// file back yields a pixel-identical bitmap.
pub fn save(
    bitmap: &Bitmap,
    identity: &SnapshotIdentity,
    kind: SnapshotKind,
) -> Result<PathBuf, StoreError> {
    let path = path(identity, kind);

    let mut encoded = Vec::new();
    bitmap
        .to_rgba_image()
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| StoreError::Encode {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Sibling temp file plus rename keeps a crashed write from leaving a
    // truncated snapshot at the final path.
    let tmp = path.with_extension("png.tmp");
    fs::write(&tmp, &encoded).map_err(|source| StoreError::Write {
        path: tmp.clone(),
        source,
    })?;
    if let Err(source) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Write { path, source });
    }

    log::info!("snapshot saved: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotConfig;
    use crate::identity::{resolve, TestContext, Variant};

    fn identity(root: &std::path::Path) -> SnapshotIdentity {
        let config = SnapshotConfig::with_root(root);
        let context = TestContext::new("CardTests", "test_card").unwrap();
        resolve(&config, &context, None, 2.0, &Variant::new("dark"))
    }

    #[test]
    fn golden_and_failure_kinds_resolve_to_separate_subtrees() {
        let identity = identity(std::path::Path::new("/tmp/proj"));

        let golden = path(&identity, SnapshotKind::Golden);
        assert_eq!(
            golden,
            PathBuf::from("/tmp/proj/UnitTests/ReferenceImages/CardTests/test_card_dark@2x.png")
        );

        let diff = path(&identity, SnapshotKind::FailureDiff);
        assert_eq!(
            diff,
            PathBuf::from("/tmp/proj/UnitTests/FailureDiffs/CardTests/diff_test_card_dark@2x.png")
        );
    }

    #[test]
    fn failure_kinds_never_collide() {
        let identity = identity(std::path::Path::new("/tmp/proj"));
        let kinds = [
            SnapshotKind::Golden,
            SnapshotKind::FailureReference,
            SnapshotKind::FailureActual,
            SnapshotKind::FailureDiff,
        ];
        let paths: Vec<_> = kinds.iter().map(|k| path(&identity, *k)).collect();
        for (i, a) in paths.iter().enumerate() {
            for b in paths.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn kind_prefixes_match_the_layout_contract() {
        assert_eq!(SnapshotKind::Golden.file_prefix(), "");
        assert_eq!(SnapshotKind::FailureReference.file_prefix(), "reference_");
        assert_eq!(SnapshotKind::FailureActual.file_prefix(), "actual_");
        assert_eq!(SnapshotKind::FailureDiff.file_prefix(), "diff_");
        assert!(!SnapshotKind::Golden.is_failure());
        assert!(SnapshotKind::FailureDiff.is_failure());
    }
}
