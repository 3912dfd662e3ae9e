//! Configuration system for cochlea.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::audio::C_MAJOR_SCALE;
use crate::error::{CochleaError, Result};
use crate::neural::{DecayModel, LayeredTopology, Layout, LearningConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub neuron: NeuronConfig,
    pub learning: LearningConfig,
    pub topology: TopologyConfig,
    pub audio: AudioConfig,
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-neuron dynamics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronConfig {
    /// Firing threshold on |potential|
    pub threshold: f64,
    /// Exponential decay rate k, per frame
    pub decay_coefficient: f64,
}

/// Layered reference topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Neurons per layer; the first layer is sensory, the last is output
    pub layer_sizes: Vec<usize>,
    #[serde(default)]
    pub layout: Layout,
}

/// Audio front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Samples per second
    pub sample_rate: f64,
    /// Simulation frames per second of audio
    pub frame_rate: f64,
    /// FFT window length (power of two)
    pub window_size: usize,
    /// Tukey taper applied to generated tones
    pub tukey_alpha: f64,
    /// Training tone frequencies in Hz, one example each
    pub tones: Vec<f64>,
    /// Length of each training tone
    pub training_seconds: f64,
    /// Length of the tone-sequence test clip
    pub test_seconds: f64,
}

/// Training schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// How many times each example is run
    pub runs_per_example: usize,
    /// Frames simulated per training run
    pub frames_per_example: usize,
    /// Frames simulated on the test clip
    pub test_frames: usize,
    /// Recursion depth of a learn pass
    pub max_depth: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Training runs between progress lines
    pub stats_interval: usize,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            decay_coefficient: 0.1,
        }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![64, 64, 8],
            layout: Layout::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            frame_rate: 10.0,
            window_size: 4096,
            tukey_alpha: 0.2,
            tones: C_MAJOR_SCALE.to_vec(),
            training_seconds: 3.0,
            test_seconds: 100.0,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            runs_per_example: 100,
            frames_per_example: 30,
            test_frames: 1000,
            max_depth: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl AudioConfig {
    /// Sample count of a clip lasting `seconds`
    pub fn samples_for(&self, seconds: f64) -> usize {
        (self.sample_rate * seconds).round() as usize
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate().map_err(CochleaError::InvalidParameter)?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.neuron.threshold <= 0.0 {
            return Err("threshold must be > 0".to_string());
        }
        if self.neuron.decay_coefficient <= 0.0 {
            return Err("decay_coefficient must be > 0".to_string());
        }
        if self.learning.coefficient <= 1.0 {
            return Err("learning coefficient must be > 1".to_string());
        }
        if !(self.learning.recency_fraction > 0.0 && self.learning.recency_fraction < 1.0) {
            return Err("recency_fraction must be in (0, 1)".to_string());
        }
        if !self.audio.window_size.is_power_of_two() {
            return Err(format!(
                "window_size must be a power of 2, got {}",
                self.audio.window_size
            ));
        }
        if !(0.0..=1.0).contains(&self.audio.tukey_alpha) {
            return Err("tukey_alpha must be in [0, 1]".to_string());
        }
        let rates = [self.audio.sample_rate, self.audio.frame_rate];
        if !rates.iter().all(|&r| r > 0.0 && r.is_finite()) {
            return Err("sample_rate and frame_rate must be finite and > 0".to_string());
        }
        if self.audio.frame_rate > self.audio.sample_rate {
            return Err("frame_rate cannot exceed sample_rate".to_string());
        }
        let frames = self.training.frames_per_example.max(self.training.test_frames);
        crate::audio::frame_layout(
            self.audio.sample_rate,
            self.audio.frame_rate,
            frames,
            self.audio.window_size,
        )
        .map_err(|e| e.to_string())?;

        let layers = &self.topology.layer_sizes;
        if layers.is_empty() || layers.contains(&0) {
            return Err("layer_sizes must be non-empty with no empty layers".to_string());
        }
        if layers[0] > self.audio.window_size {
            return Err("sensory layer cannot be wider than the FFT window".to_string());
        }
        if let Some(&outputs) = layers.last() {
            if self.audio.tones.len() > outputs {
                return Err("more tones than output neurons".to_string());
            }
        }
        Ok(())
    }

    pub fn decay(&self) -> DecayModel {
        DecayModel::new(self.neuron.decay_coefficient)
    }

    pub fn topology(&self) -> LayeredTopology {
        LayeredTopology {
            layer_sizes: self.topology.layer_sizes.clone(),
            threshold: self.neuron.threshold,
            layout: self.topology.layout.clone(),
        }
    }
}
