//! Bitmap primitives
//!
//! [`Bitmap`] is the immutable pixel value every other module operates on:
//! an RGBA8 buffer with **premultiplied** alpha, an explicit row stride and
//! the device scale it was captured at. Channel access goes through a
//! bounds-checked accessor (`y * stride + x * 4 + channel`); there is no raw
//! pointer arithmetic anywhere in the pipeline.
//!
//! Conversions to [`image::RgbaImage`] (for the PNG codec) and
//! [`tiny_skia::Pixmap`] (for diff compositing) keep the premultiplied
//! channel values verbatim so a save/load round trip is bit-identical.

use crate::error::{BitmapError, RenderError};
use image::RgbaImage;
use tiny_skia::{Pixmap, PremultipliedColorU8};

const BYTES_PER_PIXEL: usize = 4;

/// An immutable RGBA8 bitmap with premultiplied alpha.
///
/// Invariants, enforced at construction:
/// - `stride >= width * 4`
/// - `data.len() == stride * height`
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    scale: f32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Wraps a premultiplied RGBA8 buffer.
    ///
    /// `stride` is the row pitch in bytes; rows may carry trailing padding.
    pub fn from_premultiplied(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
        scale: f32,
    ) -> Result<Self, BitmapError> {
        let row_bytes = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(BitmapError::DimensionsOverflow { width, height })?;
        if stride < row_bytes {
            return Err(BitmapError::StrideTooSmall { stride, width });
        }
        let expected = stride
            .checked_mul(height as usize)
            .ok_or(BitmapError::DimensionsOverflow { width, height })?;
        if data.len() != expected {
            return Err(BitmapError::BufferSizeMismatch {
                expected,
                actual: data.len(),
                stride,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            scale,
            data,
        })
    }

    /// Creates a bitmap filled with one premultiplied RGBA pixel value.
    pub fn solid(width: u32, height: u32, pixel: [u8; 4], scale: f32) -> Result<Self, BitmapError> {
        let row_bytes = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(BitmapError::DimensionsOverflow { width, height })?;
        let bytes = row_bytes
            .checked_mul(height as usize)
            .ok_or(BitmapError::DimensionsOverflow { width, height })?;
        let mut data = Vec::with_capacity(bytes);
        for _ in 0..bytes / BYTES_PER_PIXEL {
            data.extend_from_slice(&pixel);
        }
        Self::from_premultiplied(data, width, height, row_bytes, scale)
    }

    /// Wraps a decoded [`RgbaImage`], taking its channel bytes verbatim.
    ///
    /// The image is assumed to hold premultiplied channels, which is what
    /// [`to_rgba_image`](Self::to_rgba_image) produces and the store encodes.
    pub fn from_rgba_image(image: RgbaImage, scale: f32) -> Self {
        let width = image.width();
        let height = image.height();
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            scale,
            data: image.into_raw(),
        }
    }

    /// Copies the pixels into a tightly-packed [`RgbaImage`], dropping any
    /// row padding. Channel values are carried over verbatim.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let mut raw = Vec::with_capacity(row_bytes * self.height as usize);
        for row in self.rows() {
            raw.extend_from_slice(row);
        }
        // Length matches width * height * 4 by construction.
        RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Copies a premultiplied tiny-skia pixmap into a bitmap.
    pub fn from_pixmap(pixmap: &Pixmap, scale: f32) -> Self {
        let width = pixmap.width();
        let height = pixmap.height();
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for px in pixmap.pixels() {
            data.extend_from_slice(&[px.red(), px.green(), px.blue(), px.alpha()]);
        }
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            scale,
            data,
        }
    }

    /// Copies the pixels onto a freshly acquired tiny-skia pixmap.
    ///
    /// Fails with [`RenderError::SurfaceUnavailable`] when the surface cannot
    /// be allocated (zero-sized or out-of-range dimensions).
    pub fn to_pixmap(&self) -> Result<Pixmap, RenderError> {
        let mut pixmap =
            Pixmap::new(self.width, self.height).ok_or(RenderError::SurfaceUnavailable {
                width: self.width,
                height: self.height,
            })?;
        let width = self.width;
        for (i, out) in pixmap.pixels_mut().iter_mut().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            let [r, g, b, a] = self.pixel(x, y);
            // Premultiplied channels never exceed alpha; clamp defends
            // against malformed input files rather than panicking.
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a) {
                *out = px;
            }
        }
        Ok(pixmap)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Device scale factor the bitmap was captured at.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// `(width, height)` pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The premultiplied `[r, g, b, a]` value at `(x, y)`.
    ///
    /// # Panics
    /// Panics when `(x, y)` is outside the bitmap bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} bitmap",
            self.width,
            self.height
        );
        let base = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        [
            self.data[base],
            self.data[base + 1],
            self.data[base + 2],
            self.data[base + 3],
        ]
    }

    /// Iterator over the packed pixel bytes of each row (padding excluded).
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        self.data
            .chunks_exact(self.stride.max(1))
            .map(move |row| &row[..row_bytes])
    }

    /// Raw buffer, including any row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Equality is logical: same dimensions, same scale, same pixel bytes.
/// Row padding does not participate, so a store round trip compares equal
/// for padded inputs too.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.scale.to_bits() == other.scale.to_bits()
            && self.rows().eq(other.rows())
    }
}
