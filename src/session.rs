//! Per-session state shared between setup, the render loop and teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classifier::{ClassifierAdapter, GestureClassifier};
use crate::config::SessionConfig;
use crate::frame::{Frame, FrameSource};
use crate::gesture::TriggerDetector;
use crate::store::ParticleStore;
use crate::time::SystemClock;

/// Shared cancellation flag.
///
/// Set once at teardown. Setup checks it after every suspension point and
/// the render loop checks it at the top of every iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one mounted session owns.
///
/// The particle set and trigger state are only mutated by the render loop;
/// setup and teardown interact with it through readiness and the
/// [`CancelToken`]. Dropping a session shuts it down.
pub struct Session<F: FrameSource, C: GestureClassifier, S, K = SystemClock> {
    pub(crate) frames: Option<F>,
    pub(crate) classifier: ClassifierAdapter<C>,
    pub(crate) surface: S,
    pub(crate) particles: ParticleStore,
    pub(crate) trigger: TriggerDetector,
    pub(crate) clock: K,
    pub(crate) cancel: CancelToken,
    pub(crate) last_frame: Option<Frame>,
    pub(crate) loop_active: bool,
}

impl<F, C, S, K> Session<F, C, S, K>
where
    F: FrameSource,
    C: GestureClassifier,
{
    /// Assemble a session from already-acquired collaborators.
    pub fn new(
        frames: F,
        classifier: ClassifierAdapter<C>,
        surface: S,
        config: &SessionConfig,
        clock: K,
        cancel: CancelToken,
    ) -> Self {
        let particles = match config.seed {
            Some(seed) => ParticleStore::with_seed(config.spawn.clone(), seed),
            None => ParticleStore::new(config.spawn.clone()),
        };
        Self {
            frames: Some(frames),
            classifier,
            surface,
            particles,
            trigger: TriggerDetector::new(config.trigger.clone()),
            clock,
            cancel,
            last_frame: None,
            loop_active: false,
        }
    }

    /// Frame source, surface and classifier are all available.
    pub fn is_ready(&self) -> bool {
        self.frames.as_ref().is_some_and(|f| f.is_live()) && self.classifier.is_ready()
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleStore {
        &mut self.particles
    }

    pub fn trigger(&self) -> &TriggerDetector {
        &self.trigger
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn classifier(&self) -> &ClassifierAdapter<C> {
        &self.classifier
    }

    pub fn frames(&self) -> Option<&F> {
        self.frames.as_ref()
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// The frame classified by the most recent tick.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Stop the frame source and release the classifier.
    ///
    /// Sets the cancellation flag first so no further tick runs. Each step
    /// is attempted regardless of the others; calling this again is a no-op.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.loop_active = false;
        if let Some(mut frames) = self.frames.take() {
            frames.stop();
        }
        self.classifier.release();
        self.last_frame = None;
    }
}

impl<F: FrameSource, C: GestureClassifier, S, K> Drop for Session<F, C, S, K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
