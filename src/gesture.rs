//! Classification results and the wave trigger.
//!
//! A recognizer reports, for each detected hand, a ranked list of gesture
//! [`Category`]s and a list of normalized landmarks. [`TriggerDetector`]
//! turns that stream into discrete "wave" events: the top gesture of the
//! primary hand must be the trigger gesture with enough confidence, and at
//! least the debounce window must have passed since the previous event.
//!
//! # States
//!
//! | State | Meaning |
//! |-------|---------|
//! | [`TriggerState::Armed`] | The next qualifying gesture fires |
//! | [`TriggerState::CoolingDown`] | Inside the debounce window; gestures are ignored |
//!
//! There is no timer: the detector re-arms purely because wall-clock time
//! moved past the window.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One ranked gesture hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Gesture label, e.g. `"Open_Palm"`.
    pub name: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

impl Category {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Output of one recognition call.
///
/// All three lists are indexed by hand. Landmarks are normalized to the
/// frame: `(0, 0)` is the top-left corner, `(1, 1)` the bottom-right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    /// Ranked gesture categories per hand, best first.
    pub gestures: Vec<Vec<Category>>,
    /// Normalized landmarks per hand.
    pub landmarks: Vec<Vec<Vec2>>,
    /// Left/right classification per hand.
    pub handedness: Vec<Vec<Category>>,
}

impl ClassificationResult {
    /// A result with no hands in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` when no hand was detected.
    pub fn is_empty(&self) -> bool {
        self.gestures.is_empty() && self.landmarks.is_empty()
    }

    /// Number of hands with gesture data.
    pub fn hand_count(&self) -> usize {
        self.gestures.len()
    }

    /// Best-ranked gesture for `hand`, if any.
    pub fn top_gesture(&self, hand: usize) -> Option<&Category> {
        self.gestures.get(hand)?.first()
    }

    /// Landmark `index` of `hand`, if present.
    pub fn landmark(&self, hand: usize, index: usize) -> Option<Vec2> {
        self.landmarks.get(hand)?.get(index).copied()
    }
}

/// Trigger parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Category name that fires a trigger.
    pub gesture: String,
    /// The top score must be strictly greater than this.
    pub min_score: f32,
    /// Elapsed time since the last trigger must be strictly greater than this.
    pub debounce_ms: u64,
    /// Which hand is inspected.
    pub hand: usize,
    /// Landmark whose position becomes the spawn point (9 = middle finger
    /// MCP, roughly the centre of the palm).
    pub anchor_landmark: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            gesture: "Open_Palm".to_string(),
            min_score: 0.7,
            debounce_ms: 500,
            hand: 0,
            anchor_landmark: 9,
        }
    }
}

impl TriggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(mut self, name: impl Into<String>) -> Self {
        self.gesture = name.into();
        self
    }

    pub fn min_score(mut self, score: f32) -> Self {
        self.min_score = score;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn anchor_landmark(mut self, index: usize) -> Self {
        self.anchor_landmark = index;
        self
    }
}

/// Whether the detector can fire right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Armed,
    CoolingDown,
}

/// Debounced open-palm detector.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    config: TriggerConfig,
    /// `None` until the first trigger, so the first qualifying gesture
    /// always fires.
    last_trigger_ms: Option<u64>,
}

impl TriggerDetector {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            last_trigger_ms: None,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Timestamp of the most recent accepted trigger.
    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    /// State at time `now_ms`.
    pub fn state(&self, now_ms: u64) -> TriggerState {
        match self.last_trigger_ms {
            Some(last) if now_ms.saturating_sub(last) <= self.config.debounce_ms => {
                TriggerState::CoolingDown
            }
            _ => TriggerState::Armed,
        }
    }

    /// `true` if `result`'s primary hand shows the trigger gesture with
    /// enough confidence. Does not consider the debounce window.
    pub fn is_trigger_gesture(&self, result: &ClassificationResult) -> bool {
        result
            .top_gesture(self.config.hand)
            .is_some_and(|top| top.name == self.config.gesture && top.score > self.config.min_score)
    }

    /// Decide whether `result` at `now_ms` is a new wave event.
    ///
    /// Returns the anchor landmark scaled to `surface_size` pixels. An
    /// accepted gesture starts the debounce window even when the anchor
    /// landmark turns out to be missing.
    pub fn evaluate(
        &mut self,
        result: &ClassificationResult,
        now_ms: u64,
        surface_size: Vec2,
    ) -> Option<Vec2> {
        if !self.is_trigger_gesture(result) {
            return None;
        }
        if self.state(now_ms) == TriggerState::CoolingDown {
            return None;
        }

        self.last_trigger_ms = Some(now_ms);
        let anchor = result.landmark(self.config.hand, self.config.anchor_landmark)?;
        let point = anchor * surface_size;
        log::trace!("wave at ({:.1}, {:.1}) t={}ms", point.x, point.y, now_ms);
        Some(point)
    }

    /// Forget the last trigger; the next qualifying gesture fires.
    pub fn reset(&mut self) {
        self.last_trigger_ms = None;
    }
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}
