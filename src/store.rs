//! The live particle set.
//!
//! [`ParticleStore`] owns every particle in a session. Spawning appends
//! particles with randomized motion; [`ParticleStore::advance_and_draw`] runs
//! one tick of physics and lifecycle over the whole set and draws survivors.
//!
//! # Example
//!
//! ```ignore
//! let mut store = ParticleStore::new(SpawnConfig::default());
//! store.spawn(Vec2::new(320.0, 240.0), 10);
//!
//! // Every frame:
//! surface.clear();
//! store.advance_and_draw(&mut surface);
//! ```

use std::ops::Range;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::particle::{Glyph, Particle};
use crate::surface::DrawSurface;

/// Spawn and physics parameters.
///
/// Defaults reproduce the stock effect: 10 particles per burst, 100-tick
/// lifetime, gravity of 0.5 per tick, `vx` in `[-4, 4]`, `vy` in `[-8, 0]`,
/// size in `[20, 40]`.
///
/// ```ignore
/// let config = SpawnConfig::new()
///     .count(25)
///     .life_span(60)
///     .gravity(0.3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Particles per spawn event.
    pub count: usize,
    /// Ticks a particle lives.
    pub life_span: u32,
    /// Added to vertical velocity every tick.
    pub gravity: f32,
    /// Horizontal velocity range.
    pub velocity_x: Range<f32>,
    /// Vertical velocity range (negative is up).
    pub velocity_y: Range<f32>,
    /// Size range in pixels.
    pub size: Range<f32>,
    /// Glyphs to sample from.
    pub palette: Vec<Glyph>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            count: 10,
            life_span: 100,
            gravity: 0.5,
            velocity_x: -4.0..4.0,
            velocity_y: -8.0..0.0,
            size: 20.0..40.0,
            palette: Glyph::PALETTE.to_vec(),
        }
    }
}

impl SpawnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Particles per spawn event.
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Lifetime in ticks.
    pub fn life_span(mut self, ticks: u32) -> Self {
        self.life_span = ticks;
        self
    }

    /// Per-tick gravity.
    pub fn gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Initial velocity ranges.
    pub fn velocity(mut self, x: Range<f32>, y: Range<f32>) -> Self {
        self.velocity_x = x;
        self.velocity_y = y;
        self
    }

    /// Size range in pixels.
    pub fn size(mut self, size: Range<f32>) -> Self {
        self.size = size;
        self
    }

    /// Glyph palette. An empty palette falls back to the default one.
    pub fn palette(mut self, palette: Vec<Glyph>) -> Self {
        self.palette = palette;
        self
    }
}

/// Uniform sample from `range`, tolerating empty or inverted ranges.
fn sample(rng: &mut SmallRng, range: &Range<f32>) -> f32 {
    if range.start < range.end {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

/// Owner of the live particle set.
#[derive(Debug)]
pub struct ParticleStore {
    config: SpawnConfig,
    particles: Vec<Particle>,
    rng: SmallRng,
}

impl ParticleStore {
    /// Create an empty store seeded from OS entropy.
    pub fn new(config: SpawnConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Create an empty store with a fixed seed for reproducible runs.
    pub fn with_seed(config: SpawnConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: SpawnConfig, rng: SmallRng) -> Self {
        Self {
            config,
            particles: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Number of live particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Live particles in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Drop every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Append `count` fresh particles at `position`.
    ///
    /// Each gets a random velocity, size and glyph; `life` and `max_life`
    /// both start at the configured life span.
    pub fn spawn(&mut self, position: Vec2, count: usize) {
        let default_palette = Glyph::PALETTE;
        let palette: &[Glyph] = if self.config.palette.is_empty() {
            &default_palette
        } else {
            &self.config.palette
        };

        self.particles.reserve(count);
        for _ in 0..count {
            let velocity = Vec2::new(
                sample(&mut self.rng, &self.config.velocity_x),
                sample(&mut self.rng, &self.config.velocity_y),
            );
            let size = sample(&mut self.rng, &self.config.size);
            let glyph = palette[self.rng.gen_range(0..palette.len())];
            self.particles.push(Particle {
                position,
                velocity,
                size,
                life: self.config.life_span,
                max_life: self.config.life_span,
                glyph,
            });
        }
    }

    /// Spawn the configured burst size at `position`.
    pub fn burst(&mut self, position: Vec2) {
        self.spawn(position, self.config.count);
    }

    /// Run one tick over every live particle and draw the survivors.
    ///
    /// For each particle: move by velocity, apply gravity, lose one life.
    /// Particles that reach zero life are removed in this same pass and are
    /// not drawn. Survivors are drawn with opacity `life / max_life`.
    pub fn advance_and_draw<S: DrawSurface + ?Sized>(&mut self, surface: &mut S) {
        let gravity = self.config.gravity;
        self.particles.retain_mut(|p| {
            p.step(gravity);
            if !p.is_alive() {
                return false;
            }
            surface.draw_glyph(p.glyph, p.position, p.size, p.opacity());
            true
        });
    }
}
