//! Bitmap comparison under a two-level tolerance policy
//!
//! [`compare`] decides whether an actual render is "close enough" to a
//! recorded reference. Two knobs control the decision:
//!
//! - `pixel_tolerance`: the maximum normalized per-channel difference
//!   (`|a - b| / 255`) for a single pixel to still count as equal;
//! - `overall_tolerance`: the maximum fraction of mismatched pixels across
//!   the whole bitmap.
//!
//! The scan is row-major and bails out as soon as the mismatch budget is
//! exceeded; early exit only changes latency, never the outcome. The module
//! is pure: no I/O, no shared state, safe to call concurrently on
//! independent bitmap pairs.

use crate::bitmap::Bitmap;
use crate::error::CompareError;
use serde::Serialize;

/// Tolerance policy for a comparison.
///
/// Both values are required and must lie in `[0, 1]`; there are no defaults
/// at this layer. `pixel_tolerance = 0` demands exact channel equality,
/// `pixel_tolerance = 1` makes every pixel trivially equal (degenerating the
/// comparison to a dimension check). `overall_tolerance = 0` demands a
/// perfect bitmap match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToleranceSpec {
    pixel_tolerance: f64,
    overall_tolerance: f64,
}

impl ToleranceSpec {
    /// Exact match: no per-pixel slack, no mismatched pixels allowed.
    pub const EXACT: Self = Self {
        pixel_tolerance: 0.0,
        overall_tolerance: 0.0,
    };

    /// Validates and builds a tolerance policy.
    pub fn new(pixel_tolerance: f64, overall_tolerance: f64) -> Result<Self, CompareError> {
        if !(0.0..=1.0).contains(&pixel_tolerance) {
            return Err(CompareError::ToleranceOutOfRange {
                name: "pixel_tolerance",
                value: pixel_tolerance,
            });
        }
        if !(0.0..=1.0).contains(&overall_tolerance) {
            return Err(CompareError::ToleranceOutOfRange {
                name: "overall_tolerance",
                value: overall_tolerance,
            });
        }
        Ok(Self {
            pixel_tolerance,
            overall_tolerance,
        })
    }

    /// Maximum allowed normalized per-channel difference for one pixel.
    pub fn pixel_tolerance(&self) -> f64 {
        self.pixel_tolerance
    }

    /// Maximum allowed fraction of mismatched pixels.
    pub fn overall_tolerance(&self) -> f64 {
        self.overall_tolerance
    }
}

/// Outcome of comparing two bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ComparisonOutcome {
    /// The bitmaps agree within tolerance.
    Match,
    /// Too many pixels diverge.
    Mismatch {
        /// Fraction of mismatched pixels counted before the scan stopped.
        ratio: f64,
        /// Row-major coordinates of the first diverging pixel.
        first_divergence: (u32, u32),
    },
    /// The bitmaps have different dimensions; no tolerance applies.
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl ComparisonOutcome {
    /// True for [`ComparisonOutcome::Match`].
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

impl std::fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "images match"),
            Self::Mismatch {
                ratio,
                first_divergence: (x, y),
            } => write!(
                f,
                "images differ: {:.4}% of pixels mismatched, first divergence at ({x}, {y})",
                ratio * 100.0
            ),
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "size mismatch: expected {}x{}, actual {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

/// Compares `actual` against `reference` under the given tolerance policy.
///
/// Dimension differences fail fast with [`ComparisonOutcome::SizeMismatch`];
/// otherwise pixels are scanned top-left to bottom-right and counted against
/// the mismatch budget `floor(overall_tolerance * width * height)`.
pub fn compare(
    reference: &Bitmap,
    actual: &Bitmap,
    tolerance: ToleranceSpec,
) -> ComparisonOutcome {
    if reference.dimensions() != actual.dimensions() {
        return ComparisonOutcome::SizeMismatch {
            expected: reference.dimensions(),
            actual: actual.dimensions(),
        };
    }

    let (width, height) = reference.dimensions();
    let total_pixels = u64::from(width) * u64::from(height);
    let max_mismatches = (tolerance.overall_tolerance * total_pixels as f64).floor() as u64;

    let mut mismatched: u64 = 0;
    let mut first_divergence = (0u32, 0u32);

    for y in 0..height {
        for x in 0..width {
            if pixels_equal(
                reference.pixel(x, y),
                actual.pixel(x, y),
                tolerance.pixel_tolerance,
            ) {
                continue;
            }
            mismatched += 1;
            if mismatched == 1 {
                first_divergence = (x, y);
            }
            if mismatched > max_mismatches {
                return ComparisonOutcome::Mismatch {
                    ratio: mismatched as f64 / total_pixels as f64,
                    first_divergence,
                };
            }
        }
    }

    ComparisonOutcome::Match
}

/// A pixel counts as equal iff every channel difference is within tolerance.
#[inline]
fn pixels_equal(reference: [u8; 4], actual: [u8; 4], pixel_tolerance: f64) -> bool {
    for channel in 0..4 {
        let diff = f64::from(reference[channel].abs_diff(actual[channel])) / 255.0;
        if diff > pixel_tolerance {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Bitmap {
        Bitmap::solid(width, height, pixel, 1.0).unwrap()
    }

    fn with_pixel(mut base: Vec<u8>, index: usize, pixel: [u8; 4]) -> Vec<u8> {
        base[index * 4..index * 4 + 4].copy_from_slice(&pixel);
        base
    }

    #[test]
    fn identical_bitmaps_match_exactly() {
        let bitmap = solid(4, 4, [0, 0, 0, 255]);
        assert_eq!(
            compare(&bitmap, &bitmap, ToleranceSpec::EXACT),
            ComparisonOutcome::Match
        );
    }

    #[test]
    fn dimension_mismatch_ignores_tolerance() {
        let a = solid(4, 4, [0, 0, 0, 255]);
        let b = solid(4, 5, [0, 0, 0, 255]);
        let outcome = compare(&a, &b, ToleranceSpec::new(1.0, 1.0).unwrap());
        assert_eq!(
            outcome,
            ComparisonOutcome::SizeMismatch {
                expected: (4, 4),
                actual: (4, 5),
            }
        );
    }

    #[test]
    fn full_pixel_tolerance_matches_any_same_size_pair() {
        let a = solid(3, 3, [255, 255, 255, 255]);
        let b = solid(3, 3, [0, 0, 0, 0]);
        let tolerance = ToleranceSpec::new(1.0, 0.0).unwrap();
        assert!(compare(&a, &b, tolerance).is_match());
    }

    #[test]
    fn overall_tolerance_budget_is_floored() {
        // 16 pixels, one with a red delta of 26 (~0.102 normalized).
        let reference = solid(4, 4, [100, 100, 100, 255]);
        let data = with_pixel(reference.data().to_vec(), 5, [126, 100, 100, 255]);
        let actual = Bitmap::from_premultiplied(data, 4, 4, 16, 1.0).unwrap();

        // pixel_tolerance 0.05 flags the pixel; a 0.1 overall budget floors
        // to one allowed mismatch, so the pair still matches.
        let lenient = ToleranceSpec::new(0.05, 0.1).unwrap();
        assert!(compare(&reference, &actual, lenient).is_match());

        // Lowering the overall budget to 0.05 floors to zero.
        let strict = ToleranceSpec::new(0.05, 0.05).unwrap();
        let outcome = compare(&reference, &actual, strict);
        assert_eq!(
            outcome,
            ComparisonOutcome::Mismatch {
                ratio: 1.0 / 16.0,
                first_divergence: (1, 1),
            }
        );
    }

    #[test]
    fn pixel_tolerance_absorbs_small_channel_deltas() {
        let reference = solid(4, 4, [100, 100, 100, 255]);
        let data = with_pixel(reference.data().to_vec(), 0, [112, 100, 100, 255]);
        let actual = Bitmap::from_premultiplied(data, 4, 4, 16, 1.0).unwrap();

        // 12 / 255 ~ 0.047, inside a 0.05 pixel tolerance.
        let tolerance = ToleranceSpec::new(0.05, 0.0).unwrap();
        assert!(compare(&reference, &actual, tolerance).is_match());
    }

    #[test]
    fn alpha_channel_participates() {
        let reference = solid(2, 2, [10, 10, 10, 255]);
        let actual = solid(2, 2, [10, 10, 10, 128]);
        assert!(!compare(&reference, &actual, ToleranceSpec::EXACT).is_match());
    }

    #[test]
    fn monotonic_in_overall_tolerance() {
        let reference = solid(4, 4, [0, 0, 0, 255]);
        let actual = solid(4, 4, [40, 0, 0, 255]);
        let mut matched_once = false;
        for strict_overall in [0.0, 0.5, 1.0] {
            let strict = ToleranceSpec::new(0.0, strict_overall).unwrap();
            if compare(&reference, &actual, strict).is_match() {
                matched_once = true;
                for looser in [strict_overall + 0.25, 1.0] {
                    let loose = ToleranceSpec::new(0.0, looser.min(1.0)).unwrap();
                    assert!(compare(&reference, &actual, loose).is_match());
                }
            }
        }
        // Every pixel differs, so only the full overall budget matches.
        assert!(matched_once);
    }

    #[test]
    fn first_divergence_is_row_major() {
        let reference = solid(3, 3, [0, 0, 0, 255]);
        let mut data = reference.data().to_vec();
        data = with_pixel(data, 7, [255, 0, 0, 255]); // (1, 2)
        data = with_pixel(data, 5, [255, 0, 0, 255]); // (2, 1) scans first
        let actual = Bitmap::from_premultiplied(data, 3, 3, 12, 1.0).unwrap();

        match compare(&reference, &actual, ToleranceSpec::EXACT) {
            ComparisonOutcome::Mismatch {
                first_divergence, ..
            } => assert_eq!(first_divergence, (2, 1)),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn zero_sized_bitmaps_match() {
        let empty = Bitmap::from_premultiplied(Vec::new(), 0, 0, 0, 1.0).unwrap();
        assert!(compare(&empty, &empty, ToleranceSpec::EXACT).is_match());
    }

    #[test]
    fn tolerance_rejects_out_of_range_values() {
        assert!(ToleranceSpec::new(-0.1, 0.0).is_err());
        assert!(ToleranceSpec::new(0.0, 1.5).is_err());
        assert!(ToleranceSpec::new(f64::NAN, 0.0).is_err());
    }
}
