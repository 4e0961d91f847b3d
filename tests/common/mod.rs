//! Shared helpers for snapcheck integration tests.

use snapcheck::error::RenderError;
use snapcheck::{Bitmap, RenderSource, Variant};
use std::collections::HashMap;

/// A render source that produces solid-color bitmaps, one color per variant
/// tag, and records its attach/detach lifecycle.
pub struct SolidSource {
    width: u32,
    height: u32,
    scale: f32,
    colors: HashMap<String, [u8; 4]>,
    fallback: [u8; 4],
    fail_render_on: Option<String>,
    pub attached: bool,
    pub attach_count: usize,
    pub detach_count: usize,
}

impl SolidSource {
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self {
            width,
            height,
            scale,
            colors: HashMap::new(),
            fallback: [0, 0, 0, 255],
            fail_render_on: None,
            attached: false,
            attach_count: 0,
            detach_count: 0,
        }
    }

    /// Assigns a premultiplied color to a variant tag.
    pub fn with_color(mut self, tag: &str, color: [u8; 4]) -> Self {
        self.colors.insert(tag.to_string(), color);
        self
    }

    /// Makes rendering the given variant fail.
    pub fn failing_on(mut self, tag: &str) -> Self {
        self.fail_render_on = Some(tag.to_string());
        self
    }
}

impl RenderSource for SolidSource {
    fn attach(&mut self) -> Result<(), RenderError> {
        self.attached = true;
        self.attach_count += 1;
        Ok(())
    }

    fn render(&mut self, variant: &Variant) -> Result<Bitmap, RenderError> {
        assert!(self.attached, "render called while detached");
        if self.fail_render_on.as_deref() == Some(variant.tag()) {
            return Err(RenderError::SourceFailed {
                reason: format!("injected failure for variant '{}'", variant.tag()),
            });
        }
        let color = self
            .colors
            .get(variant.tag())
            .copied()
            .unwrap_or(self.fallback);
        Bitmap::solid(self.width, self.height, color, self.scale)
            .map_err(|e| RenderError::SourceFailed {
                reason: e.to_string(),
            })
    }

    fn detach(&mut self) {
        self.attached = false;
        self.detach_count += 1;
    }
}

/// Light/dark variant pair used by most multi-theme tests.
pub fn themes() -> Vec<Variant> {
    vec![Variant::default_appearance("light"), Variant::new("dark")]
}

/// Captures store/harness log records in the test harness output.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
