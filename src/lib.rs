//! # Palmburst - gesture-triggered particle overlay
//!
//! Watches a live camera feed, classifies hand gestures on every frame and
//! bursts a wave of emoji-like particles from the palm whenever an open hand
//! is shown.
//!
//! ## Quick Start
//!
//! ```ignore
//! use palmburst::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = LifecycleManager::new(SessionConfig::default());
//!     let session = pollster::block_on(manager.mount(
//!         &DemoLoader::new(),
//!         &DemoCamera::default(),
//!         |size| ImageSurface::new(size.x, size.y),
//!         SystemClock,
//!     ))?;
//!     palmburst::run_overlay(manager, session)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Collaborators
//!
//! The camera and the recognizer are external. A [`FrameSourceProvider`]
//! opens a [`FrameSource`]; a [`ClassifierLoader`] produces a
//! [`GestureClassifier`]. Both acquisitions are async and run inside
//! [`LifecycleManager::mount`], which releases anything it acquired if
//! teardown starts first.
//!
//! ### The tick
//!
//! [`RenderLoop::tick`] clears the [`DrawSurface`], advances and draws every
//! live particle, classifies the current frame and, if the
//! [`TriggerDetector`] fires, spawns a burst at the palm. Classifier failures
//! are treated as "no hands" so the animation never stalls.
//!
//! ### Triggering
//!
//! A frame triggers when the first hand's top gesture is `Open_Palm` with a
//! score above 0.7 and more than 500 ms have passed since the last trigger.
//! All of these are configurable through [`TriggerConfig`].
//!
//! ## Configuration
//!
//! [`SessionConfig`] is plain serde data and loads from TOML:
//!
//! ```toml
//! frame_rate = 30.0
//! seed = 7
//!
//! [spawn]
//! count = 16
//! gravity = 0.35
//!
//! [trigger]
//! debounce_ms = 750
//! ```
//!
//! ## Logging
//!
//! Everything logs through the [`log`] facade. The `palmburst` binary
//! installs `env_logger`; set `RUST_LOG=palmburst=debug` to see FPS and
//! per-frame recognizer failures.

pub mod classifier;
pub mod config;
pub mod demo;
pub mod error;
pub mod frame;
pub mod gesture;
mod gpu;
pub mod lifecycle;
pub mod particle;
pub mod render_loop;
pub mod session;
pub mod store;
pub mod surface;
pub mod time;
mod window;

pub use classifier::{
    ClassifierAdapter, ClassifierLoader, ClassifierOptions, Delegate, GestureClassifier,
    RunningMode,
};
pub use config::SessionConfig;
pub use demo::{DemoCamera, DemoLoader};
pub use error::{ClassifyError, ConfigError, GpuError, OverlayError, SetupError};
pub use frame::{Frame, FrameSource, FrameSourceProvider};
pub use gesture::{Category, ClassificationResult, TriggerConfig, TriggerDetector, TriggerState};
pub use glam::{UVec2, Vec2};
pub use lifecycle::{LifecycleManager, MountPhase};
pub use particle::{Glyph, Particle};
pub use render_loop::{FixedRateScheduler, FrameScheduler, LoopState, RenderLoop, TickOutcome};
pub use session::{CancelToken, Session};
pub use store::{ParticleStore, SpawnConfig};
pub use surface::{DrawCommand, DrawSurface, ImageSurface, RecordingSurface};
pub use time::{Clock, ManualClock, SystemClock, Time};
pub use window::run_overlay;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use palmburst::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classifier::{ClassifierLoader, ClassifierOptions, GestureClassifier};
    pub use crate::config::SessionConfig;
    pub use crate::demo::{DemoCamera, DemoLoader};
    pub use crate::frame::{Frame, FrameSource, FrameSourceProvider};
    pub use crate::gesture::{Category, ClassificationResult, TriggerConfig};
    pub use crate::lifecycle::LifecycleManager;
    pub use crate::render_loop::{FixedRateScheduler, RenderLoop, TickOutcome};
    pub use crate::store::SpawnConfig;
    pub use crate::surface::{DrawSurface, ImageSurface};
    pub use crate::time::{Clock, SystemClock};
    pub use crate::window::run_overlay;
    pub use crate::{UVec2, Vec2};
}
