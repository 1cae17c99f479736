//! Session mount and unmount.
//!
//! [`LifecycleManager::mount`] acquires the recognizer and the camera, in
//! that order, and assembles a [`Session`]. Both acquisitions may suspend. If
//! teardown starts while either is in flight, whatever arrives afterwards is
//! released on the spot and mount resolves to [`SetupError::Canceled`].
//!
//! Every mount gets its own [`CancelToken`], so the same manager can mount
//! again after an unmount.
//!
//! ```ignore
//! let manager = LifecycleManager::new(SessionConfig::default());
//! let mut session = pollster::block_on(manager.mount(
//!     &loader,
//!     &camera,
//!     |size| ImageSurface::new(size.x, size.y),
//!     SystemClock,
//! ))?;
//!
//! RenderLoop::new().run(&mut session, &mut scheduler);
//! manager.unmount(&mut session);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use glam::UVec2;

use crate::classifier::{ClassifierAdapter, ClassifierLoader, GestureClassifier};
use crate::config::SessionConfig;
use crate::error::SetupError;
use crate::frame::{FrameSource, FrameSourceProvider};
use crate::session::{CancelToken, Session};
use crate::surface::DrawSurface;
use crate::time::Clock;

/// Mount phase, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPhase {
    LoadingModel,
    OpeningCamera,
    Ready,
}

/// Owns acquisition and teardown of a session's external resources.
///
/// Clones share the token of the most recent mount, so a clone can cancel a
/// mount that is still in flight.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    config: SessionConfig,
    current: Arc<Mutex<CancelToken>>,
}

impl LifecycleManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            current: Arc::new(Mutex::new(CancelToken::new())),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The token of the most recent mount.
    pub fn cancel_token(&self) -> CancelToken {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `true` if the most recent mount has been canceled or unmounted.
    pub fn is_canceled(&self) -> bool {
        self.cancel_token().is_canceled()
    }

    fn begin_mount(&self) -> CancelToken {
        let token = CancelToken::new();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    /// Load the recognizer, open the camera and build a session.
    ///
    /// `make_surface` receives the camera's frame dimensions so the overlay
    /// matches the video pixel-for-pixel. On any failure everything acquired
    /// so far has been released before the error is returned.
    pub async fn mount<L, P, S, K>(
        &self,
        loader: &L,
        camera: &P,
        make_surface: impl FnOnce(UVec2) -> S,
        clock: K,
    ) -> Result<Session<P::Source, L::Classifier, S, K>, SetupError>
    where
        L: ClassifierLoader,
        P: FrameSourceProvider,
        S: DrawSurface,
        K: Clock,
    {
        let cancel = self.begin_mount();

        log::info!(
            "{:?}: {} ({:?}, {:?}, {} hands)",
            MountPhase::LoadingModel,
            self.config.classifier.model_path,
            self.config.classifier.delegate,
            self.config.classifier.running_mode,
            self.config.classifier.max_hands
        );
        let classifier = loader.load(&self.config.classifier).await.map_err(|e| {
            log::error!("setup failed while loading model: {}", e);
            e
        })?;
        let mut adapter = ClassifierAdapter::new(classifier);

        if cancel.is_canceled() {
            log::info!("teardown during model load; releasing recognizer");
            adapter.release();
            return Err(SetupError::Canceled);
        }

        log::info!("{:?}", MountPhase::OpeningCamera);
        let mut frames = match camera.open().await {
            Ok(frames) => frames,
            Err(e) => {
                log::error!("setup failed while opening camera: {}", e);
                adapter.release();
                return Err(e);
            }
        };

        if cancel.is_canceled() {
            log::info!("teardown during camera open; stopping stream");
            frames.stop();
            adapter.release();
            return Err(SetupError::Canceled);
        }

        let size = frames.dimensions();
        if size.x == 0 || size.y == 0 {
            frames.stop();
            adapter.release();
            return Err(SetupError::Camera(format!(
                "camera reported empty frames ({}x{})",
                size.x, size.y
            )));
        }

        log::info!("{:?}: {}x{} overlay", MountPhase::Ready, size.x, size.y);
        Ok(Session::new(
            frames,
            adapter,
            make_surface(size),
            &self.config,
            clock,
            cancel,
        ))
    }

    /// Signal teardown while a mount is pending. Once the mount resolves it
    /// releases what it acquired and returns [`SetupError::Canceled`].
    ///
    /// A later mount starts with a fresh token and is unaffected.
    pub fn cancel(&self) {
        self.cancel_token().cancel();
    }

    /// Tear a mounted session down: stop scheduling, stop the camera,
    /// release the recognizer. Also cancels a mount still in flight.
    pub fn unmount<F, C, S, K>(&self, session: &mut Session<F, C, S, K>)
    where
        F: FrameSource,
        C: GestureClassifier,
    {
        self.cancel();
        session.shutdown();
        log::info!("session unmounted");
    }
}
