//! The particle entity and its glyph palette.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Visual symbol a particle is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Sparkles,
    Star,
    Heart,
    PartyPopper,
    GlowingStar,
}

/// Shape used when a glyph is rasterised instead of rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphShape {
    /// Four-pointed star (|dx| + |dy| <= r).
    Diamond,
    /// Filled circle.
    Disc,
    /// Circle with a bright core.
    Halo,
}

impl Glyph {
    /// The default palette, in the order particles sample from.
    pub const PALETTE: [Glyph; 5] = [
        Glyph::Sparkles,
        Glyph::Star,
        Glyph::Heart,
        Glyph::PartyPopper,
        Glyph::GlowingStar,
    ];

    /// Text form of the glyph.
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Sparkles => "\u{2728}",
            Glyph::Star => "\u{2B50}",
            Glyph::Heart => "\u{1F496}",
            Glyph::PartyPopper => "\u{1F389}",
            Glyph::GlowingStar => "\u{1F31F}",
        }
    }

    /// RGBA colour used by raster surfaces.
    pub fn color(self) -> [u8; 4] {
        match self {
            Glyph::Sparkles => [255, 236, 140, 255],
            Glyph::Star => [255, 200, 40, 255],
            Glyph::Heart => [255, 105, 180, 255],
            Glyph::PartyPopper => [120, 200, 255, 255],
            Glyph::GlowingStar => [255, 240, 200, 255],
        }
    }

    /// Shape used by raster surfaces.
    pub fn shape(self) -> GlyphShape {
        match self {
            Glyph::Sparkles | Glyph::Star => GlyphShape::Diamond,
            Glyph::Heart | Glyph::PartyPopper => GlyphShape::Disc,
            Glyph::GlowingStar => GlyphShape::Halo,
        }
    }
}

/// A single transient particle.
///
/// `life` counts down one per tick from `max_life`. A particle only exists in
/// a store while `life > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Canvas position in pixels.
    pub position: Vec2,
    /// Displacement applied every tick.
    pub velocity: Vec2,
    /// Rendering scale (font size in pixels).
    pub size: f32,
    /// Remaining ticks.
    pub life: u32,
    /// Life at spawn time.
    pub max_life: u32,
    /// Symbol to draw.
    pub glyph: Glyph,
}

impl Particle {
    /// Remaining life fraction, used as draw opacity.
    #[inline]
    pub fn opacity(&self) -> f32 {
        if self.max_life == 0 {
            return 0.0;
        }
        self.life as f32 / self.max_life as f32
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Integrate one tick of motion and age the particle.
    ///
    /// Position moves by the current velocity before gravity is applied, so
    /// a particle spawned with `vy = 0` does not move vertically on its first
    /// tick.
    #[inline]
    pub(crate) fn step(&mut self, gravity: f32) {
        self.position += self.velocity;
        self.velocity.y += gravity;
        self.life = self.life.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(life: u32, max_life: u32) -> Particle {
        Particle {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, -2.0),
            size: 20.0,
            life,
            max_life,
            glyph: Glyph::Star,
        }
    }

    #[test]
    fn test_opacity_is_life_fraction() {
        assert_eq!(particle(100, 100).opacity(), 1.0);
        assert_eq!(particle(25, 100).opacity(), 0.25);
        assert_eq!(particle(0, 100).opacity(), 0.0);
        assert_eq!(particle(0, 0).opacity(), 0.0);
    }

    #[test]
    fn test_step_integrates_then_applies_gravity() {
        let mut p = particle(3, 3);
        p.step(0.5);
        assert_eq!(p.position, Vec2::new(1.0, -2.0));
        assert_eq!(p.velocity, Vec2::new(1.0, -1.5));
        assert_eq!(p.life, 2);

        p.step(0.5);
        assert_eq!(p.position, Vec2::new(2.0, -3.5));
    }

    #[test]
    fn test_step_never_underflows() {
        let mut p = particle(0, 10);
        p.step(0.5);
        assert_eq!(p.life, 0);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_palette_symbols_are_distinct() {
        let mut symbols: Vec<_> = Glyph::PALETTE.iter().map(|g| g.symbol()).collect();
        symbols.dedup();
        assert_eq!(symbols.len(), Glyph::PALETTE.len());
    }
}
