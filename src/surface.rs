//! Drawing surfaces the particle store renders onto.
//!
//! The overlay only needs two operations from a surface: clear it, and draw a
//! glyph at a position with a given scale and opacity. [`DrawSurface`] captures
//! that contract. Two implementations ship with the crate:
//!
//! | Surface | Use |
//! |---------|-----|
//! | [`ImageSurface`] | CPU raster into an `RgbaImage`, shown in the overlay or saved as PNG |
//! | [`RecordingSurface`] | Records draw calls; headless diagnostics and tests |

use std::path::Path;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::particle::{Glyph, GlyphShape};

/// A 2D surface that can be cleared and drawn on.
pub trait DrawSurface {
    /// Surface size in pixels.
    fn size(&self) -> Vec2;

    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// Draw `glyph` centred at `position`, scaled to `size` pixels, with
    /// `opacity` in `[0, 1]`.
    fn draw_glyph(&mut self, glyph: Glyph, position: Vec2, size: f32, opacity: f32);
}

impl<S: DrawSurface + ?Sized> DrawSurface for &mut S {
    fn size(&self) -> Vec2 {
        (**self).size()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn draw_glyph(&mut self, glyph: Glyph, position: Vec2, size: f32, opacity: f32) {
        (**self).draw_glyph(glyph, position, size, opacity)
    }
}

// ============================================================================
// Raster surface
// ============================================================================

/// Transparent RGBA raster surface.
///
/// Glyphs are rasterised as soft-edged coloured shapes (see
/// [`Glyph::shape`]) and alpha-blended over what is already there.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// The raster backing this surface.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Layer this surface over `background`, returning the composite.
    ///
    /// Sizes are not reconciled: the overlay is placed at the top-left corner
    /// and clipped to the background.
    pub fn composite_over(&self, background: &RgbaImage) -> RgbaImage {
        let mut out = background.clone();
        image::imageops::overlay(&mut out, &self.image, 0, 0);
        out
    }

    /// Save the current contents as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }

    fn blend(&mut self, x: u32, y: u32, color: [u8; 4], alpha: f32) {
        let dst = self.image.get_pixel_mut(x, y);
        let src_a = alpha.clamp(0.0, 1.0);
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= f32::EPSILON {
            return;
        }
        let mut out = [0u8; 4];
        for c in 0..3 {
            let s = color[c] as f32;
            let d = dst[c] as f32;
            out[c] = ((s * src_a + d * dst_a * (1.0 - src_a)) / out_a).round() as u8;
        }
        out[3] = (out_a * 255.0).round() as u8;
        *dst = Rgba(out);
    }
}

/// Coverage of a pixel at offset `(dx, dy)` from a glyph centre of radius `r`.
fn coverage(shape: GlyphShape, dx: f32, dy: f32, r: f32) -> f32 {
    match shape {
        GlyphShape::Diamond => (r - (dx.abs() + dy.abs())).clamp(0.0, 1.0),
        GlyphShape::Disc => (r - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0),
        GlyphShape::Halo => {
            let d = (dx * dx + dy * dy).sqrt() / r;
            (1.0 - d).clamp(0.0, 1.0).sqrt()
        }
    }
}

impl DrawSurface for ImageSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }

    fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_glyph(&mut self, glyph: Glyph, position: Vec2, size: f32, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 || size <= 0.0 {
            return;
        }
        let (w, h) = self.image.dimensions();
        let r = size * 0.5;
        let x0 = (position.x - r).floor().max(0.0);
        let y0 = (position.y - r).floor().max(0.0);
        let x1 = (position.x + r).ceil().min(w as f32 - 1.0);
        let y1 = (position.y + r).ceil().min(h as f32 - 1.0);
        if x1 < x0 || y1 < y0 {
            return;
        }

        let color = glyph.color();
        let base_alpha = color[3] as f32 / 255.0 * opacity;
        let shape = glyph.shape();
        for y in y0 as u32..=y1 as u32 {
            for x in x0 as u32..=x1 as u32 {
                let dx = x as f32 + 0.5 - position.x;
                let dy = y as f32 + 0.5 - position.y;
                let cov = coverage(shape, dx, dy, r);
                if cov > 0.0 {
                    self.blend(x, y, color, base_alpha * cov);
                }
            }
        }
    }
}

// ============================================================================
// Recording surface
// ============================================================================

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Glyph {
        glyph: Glyph,
        position: Vec2,
        size: f32,
        opacity: f32,
    },
}

/// Surface that records every call instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    /// Every command recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Glyph draws issued since the most recent clear.
    pub fn current_frame(&self) -> impl Iterator<Item = &DrawCommand> {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.commands[start..].iter()
    }

    /// Number of clears issued.
    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear))
            .count()
    }

    /// Drop recorded history.
    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_glyph(&mut self, glyph: Glyph, position: Vec2, size: f32, opacity: f32) {
        self.commands.push(DrawCommand::Glyph {
            glyph,
            position,
            size,
            opacity,
        });
    }
}
