//! Session configuration.
//!
//! Every knob has a default, so an empty file (or no file) gives the stock
//! effect. A TOML file can override any subset:
//!
//! ```toml
//! frame_rate = 30.0
//! mirror = false
//!
//! [spawn]
//! count = 20
//! gravity = 0.25
//! palette = ["heart", "star"]
//!
//! [trigger]
//! debounce_ms = 800
//!
//! [classifier]
//! delegate = "CPU"
//! max_hands = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierOptions;
use crate::error::ConfigError;
use crate::gesture::TriggerConfig;
use crate::store::SpawnConfig;

/// Everything a session needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub spawn: SpawnConfig,
    pub trigger: TriggerConfig,
    pub classifier: ClassifierOptions,
    /// Target ticks per second for the fixed-rate scheduler.
    pub frame_rate: f32,
    /// Show video and particles mirrored, like a selfie camera.
    pub mirror: bool,
    /// Fixed RNG seed for reproducible particle motion.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn: SpawnConfig::default(),
            trigger: TriggerConfig::default(),
            classifier: ClassifierOptions::default(),
            frame_rate: 60.0,
            mirror: true,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierOptions) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_frame_rate(mut self, fps: f32) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
