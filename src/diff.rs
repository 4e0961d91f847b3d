//! Diff overlay rendering
//!
//! [`render_difference`] turns a failed comparison into a reviewable image:
//! the reference is drawn at full opacity, then the actual render is
//! composited on top at 50% opacity inside a transparency layer that is
//! difference-blended against a solid white fill clipped to the reference's
//! bounding rectangle. Any channel divergence survives the difference blend
//! as a non-black pixel, so changed regions glow against the agreeing ones.
//!
//! The overlay is a diagnostic artifact only; it is never compared against
//! anything.

use crate::bitmap::Bitmap;
use crate::error::RenderError;
use tiny_skia::{BlendMode, Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

/// Renders the visual difference between two bitmaps.
///
/// The output canvas spans the larger of the two inputs in each dimension
/// over an opaque background; a smaller input simply contributes transparent
/// pixels outside its bounds. The only failure mode is being unable to
/// acquire a drawing surface, which is a resource condition rather than a
/// data condition.
pub fn render_difference(reference: &Bitmap, actual: &Bitmap) -> Result<Bitmap, RenderError> {
    let width = reference.width().max(actual.width());
    let height = reference.height().max(actual.height());

    let mut canvas = new_surface(width, height)?;
    canvas.fill(Color::BLACK);

    if !reference.is_empty() {
        let reference_pixmap = reference.to_pixmap()?;
        canvas.draw_pixmap(
            0,
            0,
            reference_pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    // The transparency layer groups the actual render and the difference
    // fill so the pair is composited onto the reference as one unit at
    // half opacity.
    let mut layer = new_surface(width, height)?;
    if !actual.is_empty() {
        let actual_pixmap = actual.to_pixmap()?;
        layer.draw_pixmap(
            0,
            0,
            actual_pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    // Difference against white inverts agreeing pixels and amplifies any
    // divergence, restricted to the rectangle the reference occupies.
    if let Some(rect) = Rect::from_xywh(0.0, 0.0, reference.width() as f32, reference.height() as f32)
    {
        let mut paint = Paint::default();
        paint.set_color(Color::WHITE);
        paint.blend_mode = BlendMode::Difference;
        paint.anti_alias = false;
        layer.fill_rect(rect, &paint, Transform::identity(), None);
    }

    let mut layer_paint = PixmapPaint::default();
    layer_paint.opacity = 0.5;
    canvas.draw_pixmap(0, 0, layer.as_ref(), &layer_paint, Transform::identity(), None);

    Ok(Bitmap::from_pixmap(&canvas, reference.scale()))
}

fn new_surface(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    Pixmap::new(width, height).ok_or(RenderError::SurfaceUnavailable { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Bitmap {
        Bitmap::solid(width, height, pixel, 1.0).unwrap()
    }

    #[test]
    fn canvas_spans_the_larger_input() {
        let reference = solid(4, 8, [0, 0, 0, 255]);
        let actual = solid(6, 2, [0, 0, 0, 255]);
        let diff = render_difference(&reference, &actual).unwrap();
        assert_eq!(diff.dimensions(), (6, 8));
    }

    #[test]
    fn output_is_opaque() {
        let reference = solid(2, 2, [255, 255, 255, 255]);
        let actual = solid(4, 4, [0, 0, 0, 255]);
        let diff = render_difference(&reference, &actual).unwrap();
        for y in 0..diff.height() {
            for x in 0..diff.width() {
                assert_eq!(diff.pixel(x, y)[3], 255, "alpha at ({x}, {y})");
            }
        }
    }

    #[test]
    fn identical_opaque_inputs_produce_inverted_overlay() {
        // Agreeing white pixels difference to black against the white fill,
        // then composite at half opacity over the white reference: mid gray.
        let reference = solid(2, 2, [255, 255, 255, 255]);
        let actual = solid(2, 2, [255, 255, 255, 255]);
        let diff = render_difference(&reference, &actual).unwrap();
        let [r, g, b, _] = diff.pixel(0, 0);
        for channel in [r, g, b] {
            assert!((120..=135).contains(&channel), "channel {channel}");
        }
    }

    #[test]
    fn diverging_pixels_stand_out_from_agreeing_ones() {
        let reference = solid(2, 1, [255, 255, 255, 255]);
        // Left pixel agrees, right pixel is black.
        let data = vec![255, 255, 255, 255, 0, 0, 0, 255];
        let actual = Bitmap::from_premultiplied(data, 2, 1, 8, 1.0).unwrap();

        let diff = render_difference(&reference, &actual).unwrap();
        let agreeing = diff.pixel(0, 0);
        let diverging = diff.pixel(1, 0);
        assert!(
            diverging[0] > agreeing[0],
            "divergence should brighten: {diverging:?} vs {agreeing:?}"
        );
    }

    #[test]
    fn zero_sized_inputs_cannot_acquire_a_surface() {
        let empty = Bitmap::from_premultiplied(Vec::new(), 0, 0, 0, 1.0).unwrap();
        assert!(matches!(
            render_difference(&empty, &empty),
            Err(RenderError::SurfaceUnavailable { .. })
        ));
    }

    #[test]
    fn diff_carries_the_reference_scale() {
        let reference = Bitmap::solid(2, 2, [0, 0, 0, 255], 3.0).unwrap();
        let actual = Bitmap::solid(2, 2, [10, 0, 0, 255], 1.0).unwrap();
        let diff = render_difference(&reference, &actual).unwrap();
        assert_eq!(diff.scale(), 3.0);
    }
}
