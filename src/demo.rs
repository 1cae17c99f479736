//! Stand-in collaborators for running without a camera or model.
//!
//! [`DemoCamera`] synthesizes frames showing a hand-coloured blob moving
//! along a Lissajous path; [`DemoLoader`] yields a [`DemoRecognizer`] that
//! reports the same path on a fixed script:
//!
//! | Phase (1.5 s each) | Reported gesture |
//! |--------------------|------------------|
//! | 0 | `Open_Palm` at 0.92 |
//! | 1 | `Closed_Fist` at 0.88 |
//! | 2 | no hands |
//!
//! Every 37th call fails, exercising the transient-failure path.

use std::future::Future;

use glam::{UVec2, Vec2};
use image::{Rgba, RgbaImage};

use crate::classifier::{ClassifierLoader, ClassifierOptions, GestureClassifier};
use crate::error::{ClassifyError, SetupError};
use crate::frame::{Frame, FrameSource, FrameSourceProvider};
use crate::gesture::{Category, ClassificationResult};
use crate::time::{Clock, SystemClock};

/// Length of one script phase.
pub const PHASE_MS: u64 = 1_500;

const LANDMARKS_PER_HAND: usize = 21;
const PALM_LANDMARK: usize = 9;
const FAILURE_PERIOD: u64 = 37;

/// Normalized hand position at `timestamp_ms`.
pub fn hand_position(timestamp_ms: u64) -> Vec2 {
    let t = (timestamp_ms % 60_000) as f32 / 1_000.0;
    Vec2::new(0.5 + 0.3 * (t * 0.9).cos(), 0.5 + 0.25 * (t * 1.3).sin())
}

/// Script phase (0, 1 or 2) at `timestamp_ms`.
pub fn phase(timestamp_ms: u64) -> u64 {
    (timestamp_ms / PHASE_MS) % 3
}

/// 21 landmarks fanned around `palm`, with index 9 exactly on it.
fn hand_landmarks(palm: Vec2) -> Vec<Vec2> {
    (0..LANDMARKS_PER_HAND)
        .map(|i| {
            if i == PALM_LANDMARK {
                return palm;
            }
            let angle = i as f32 / LANDMARKS_PER_HAND as f32 * std::f32::consts::TAU;
            let reach = 0.02 + 0.004 * (i % 4) as f32;
            palm + Vec2::new(angle.cos(), angle.sin()) * reach
        })
        .collect()
}

// ============================================================================
// Camera
// ============================================================================

/// Opens a [`DemoFeed`].
#[derive(Debug, Clone)]
pub struct DemoCamera {
    size: UVec2,
    fail: Option<String>,
}

impl DemoCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: UVec2::new(width, height),
            fail: None,
        }
    }

    /// Make `open` fail with a permission error.
    pub fn denied(mut self, reason: impl Into<String>) -> Self {
        self.fail = Some(reason.into());
        self
    }
}

impl Default for DemoCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl FrameSourceProvider for DemoCamera {
    type Source = DemoFeed;

    fn open(&self) -> impl Future<Output = Result<DemoFeed, SetupError>> {
        let result = match &self.fail {
            Some(reason) => Err(SetupError::PermissionDenied(reason.clone())),
            None => Ok(DemoFeed::new(self.size)),
        };
        std::future::ready(result)
    }
}

/// Synthetic video stream.
#[derive(Debug)]
pub struct DemoFeed {
    size: UVec2,
    background: RgbaImage,
    index: u64,
    live: bool,
}

impl DemoFeed {
    fn new(size: UVec2) -> Self {
        let background = RgbaImage::from_fn(size.x, size.y, |x, y| {
            let fx = x as f32 / size.x.max(1) as f32;
            let fy = y as f32 / size.y.max(1) as f32;
            Rgba([
                (20.0 + 40.0 * fx) as u8,
                (24.0 + 30.0 * fy) as u8,
                (48.0 + 60.0 * (1.0 - fy)) as u8,
                255,
            ])
        });
        Self {
            size,
            background,
            index: 0,
            live: true,
        }
    }

    /// Frame for `timestamp_ms`, with the hand drawn when it is visible.
    pub fn render_at(&self, timestamp_ms: u64) -> RgbaImage {
        let mut image = self.background.clone();
        if phase(timestamp_ms) == 2 {
            return image;
        }
        let centre = hand_position(timestamp_ms) * self.size.as_vec2();
        let radius = self.size.x.min(self.size.y) as f32 * 0.08;
        let x0 = (centre.x - radius).max(0.0) as u32;
        let y0 = (centre.y - radius).max(0.0) as u32;
        let x1 = ((centre.x + radius) as u32).min(self.size.x.saturating_sub(1));
        let y1 = ((centre.y + radius) as u32).min(self.size.y.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32, y as f32).distance(centre);
                if d <= radius {
                    image.put_pixel(x, y, Rgba([224, 172, 140, 255]));
                }
            }
        }
        image
    }
}

impl FrameSource for DemoFeed {
    fn dimensions(&self) -> UVec2 {
        self.size
    }

    fn current_frame(&mut self) -> Option<Frame> {
        if !self.live {
            return None;
        }
        self.index += 1;
        Some(Frame::new(self.render_at(SystemClock.now_ms()), self.index))
    }

    fn stop(&mut self) {
        if self.live {
            log::debug!("demo feed stopped after {} frames", self.index);
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

// ============================================================================
// Recognizer
// ============================================================================

/// Loads a [`DemoRecognizer`].
#[derive(Debug, Clone, Default)]
pub struct DemoLoader {
    fail: Option<String>,
}

impl DemoLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `load` fail with a model error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail: Some(reason.into()),
        }
    }
}

impl ClassifierLoader for DemoLoader {
    type Classifier = DemoRecognizer;

    fn load(
        &self,
        options: &ClassifierOptions,
    ) -> impl Future<Output = Result<DemoRecognizer, SetupError>> {
        let result = match &self.fail {
            Some(reason) => Err(SetupError::ModelLoad(reason.clone())),
            None => Ok(DemoRecognizer {
                max_hands: options.max_hands,
                calls: 0,
                last_timestamp: None,
                closed: false,
            }),
        };
        std::future::ready(result)
    }
}

/// Scripted recognizer following [`hand_position`] and [`phase`].
#[derive(Debug)]
pub struct DemoRecognizer {
    max_hands: u32,
    calls: u64,
    last_timestamp: Option<u64>,
    closed: bool,
}

impl GestureClassifier for DemoRecognizer {
    fn classify(
        &mut self,
        _frame: &Frame,
        timestamp_ms: u64,
    ) -> Result<ClassificationResult, ClassifyError> {
        if self.closed {
            return Err(ClassifyError::Recognition("recognizer is closed".into()));
        }
        if let Some(previous_ms) = self.last_timestamp {
            if timestamp_ms < previous_ms {
                return Err(ClassifyError::Timestamp {
                    timestamp_ms,
                    previous_ms,
                });
            }
        }
        self.last_timestamp = Some(timestamp_ms);
        self.calls += 1;
        if self.calls % FAILURE_PERIOD == 0 {
            return Err(ClassifyError::Recognition("tracking lost".into()));
        }

        let (name, score) = match phase(timestamp_ms) {
            0 => ("Open_Palm", 0.92),
            1 => ("Closed_Fist", 0.88),
            _ => return Ok(ClassificationResult::empty()),
        };
        if self.max_hands == 0 {
            return Ok(ClassificationResult::empty());
        }
        Ok(ClassificationResult {
            gestures: vec![vec![Category::new(name, score), Category::new("None", 0.05)]],
            landmarks: vec![hand_landmarks(hand_position(timestamp_ms))],
            handedness: vec![vec![Category::new("Right", 0.97)]],
        })
    }

    fn close(&mut self) -> Result<(), ClassifyError> {
        if self.closed {
            return Err(ClassifyError::Close("already closed".into()));
        }
        self.closed = true;
        Ok(())
    }
}
