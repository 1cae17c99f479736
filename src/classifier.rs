//! Gesture recognizer integration.
//!
//! The recognition model itself is an external capability. This module
//! defines the traits a backend implements ([`ClassifierLoader`] and
//! [`GestureClassifier`]) and the [`ClassifierAdapter`] the render loop talks
//! to. The adapter owns the loaded recognizer, swallows per-frame failures,
//! and makes release idempotent.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, SetupError};
use crate::frame::Frame;
use crate::gesture::ClassificationResult;

/// Published float16 gesture recognizer bundle.
pub const DEFAULT_MODEL_PATH: &str = "https://storage.googleapis.com/mediapipe-models/\
gesture_recognizer/gesture_recognizer/float16/1/gesture_recognizer.task";

/// Hardware the recognizer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Delegate {
    Cpu,
    #[default]
    Gpu,
}

/// How frames are fed to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningMode {
    /// Independent still images.
    Image,
    /// Sequential video frames with increasing timestamps.
    #[default]
    Video,
    /// Asynchronous live stream with result callbacks.
    LiveStream,
}

/// Recognizer initialization options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Path or URL of the model bundle.
    pub model_path: String,
    pub delegate: Delegate,
    pub running_mode: RunningMode,
    /// Maximum number of hands to detect per frame.
    pub max_hands: u32,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.to_string(),
            delegate: Delegate::Gpu,
            running_mode: RunningMode::Video,
            max_hands: 2,
        }
    }
}

/// A loaded recognizer.
pub trait GestureClassifier {
    /// Classify one frame. `timestamp_ms` must increase between calls in
    /// video mode.
    fn classify(
        &mut self,
        frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<ClassificationResult, ClassifyError>;

    /// Free the recognizer's resources.
    fn close(&mut self) -> Result<(), ClassifyError>;
}

/// Loads a [`GestureClassifier`] from [`ClassifierOptions`].
pub trait ClassifierLoader {
    type Classifier: GestureClassifier;

    /// Fetch and initialize the model. Any failure (network, model format,
    /// unsupported delegate) is reported as a [`SetupError`].
    fn load(
        &self,
        options: &ClassifierOptions,
    ) -> impl Future<Output = Result<Self::Classifier, SetupError>>;
}

/// Failure-tolerant wrapper around a loaded recognizer.
///
/// Starts empty; [`install`](ClassifierAdapter::install) hands it a loaded
/// recognizer. Every call is safe whether or not a recognizer is installed.
/// Dropping the adapter releases the recognizer.
#[derive(Debug)]
pub struct ClassifierAdapter<C: GestureClassifier> {
    inner: Option<C>,
    classified: u64,
    failures: u64,
}

impl<C: GestureClassifier> ClassifierAdapter<C> {
    /// An adapter with nothing installed.
    pub fn empty() -> Self {
        Self {
            inner: None,
            classified: 0,
            failures: 0,
        }
    }

    /// An adapter owning `classifier`.
    pub fn new(classifier: C) -> Self {
        let mut adapter = Self::empty();
        adapter.install(classifier);
        adapter
    }

    /// Install a recognizer, releasing any previous one.
    pub fn install(&mut self, classifier: C) {
        self.release();
        self.inner = Some(classifier);
    }

    /// `true` while a recognizer is installed.
    pub fn is_ready(&self) -> bool {
        self.inner.is_some()
    }

    /// Classify `frame`, treating any failure as "no detection".
    pub fn classify(&mut self, frame: &Frame, timestamp_ms: u64) -> ClassificationResult {
        let Some(classifier) = self.inner.as_mut() else {
            return ClassificationResult::empty();
        };
        match classifier.classify(frame, timestamp_ms) {
            Ok(result) => {
                self.classified += 1;
                result
            }
            Err(e) => {
                self.failures += 1;
                log::debug!("recognition failed for frame {}: {}", frame.index, e);
                ClassificationResult::empty()
            }
        }
    }

    /// Close and drop the recognizer. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut classifier) = self.inner.take() {
            if let Err(e) = classifier.close() {
                log::warn!("ignoring error while closing recognizer: {}", e);
            }
        }
    }

    /// Successful classifications so far.
    pub fn classified_count(&self) -> u64 {
        self.classified
    }

    /// Swallowed failures so far.
    pub fn failure_count(&self) -> u64 {
        self.failures
    }
}

impl<C: GestureClassifier> Drop for ClassifierAdapter<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: GestureClassifier> Default for ClassifierAdapter<C> {
    fn default() -> Self {
        Self::empty()
    }
}
