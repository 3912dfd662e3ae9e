//! # cochlea
//!
//! Spiking neural network that learns to recognise tones from an FFT
//! spectrogram, with recency-windowed Hebbian learning.
//!
//! ## Features
//!
//! - **Decayed memory**: potential is the exponentially decayed sum of past spikes
//! - **No cascades**: every frame decides who fires before anything fires
//! - **Local learning**: multiplicative Hebbian updates with bounded upstream recursion
//! - **Audio front end**: radix-2 FFT, Tukey-tapered tones, globally normalized spectrograms
//! - **Reproducible**: topology and training order come from a seeded RNG
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cochlea::training::{tone_examples, Trainer};
//! use cochlea::Config;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = Config::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let mut network = config
//!     .topology()
//!     .build(config.decay(), config.learning.clone(), &mut rng)
//!     .unwrap();
//!
//! let examples = tone_examples(&network, &config).unwrap();
//! let history = Trainer::from_config(&config)
//!     .train(&mut network, &examples, &mut rng)
//!     .unwrap();
//! println!("{}", history.summary());
//! ```
//!
//! ## Manual stepping
//!
//! ```rust
//! use cochlea::neural::{DecayModel, LearningConfig, Location, Network, Sign};
//!
//! let mut net = Network::new(DecayModel::default(), LearningConfig::default());
//! let a = net.add_neuron(0, 1.0, Location::default());
//! let b = net.add_neuron(1, 1.0, Location::default());
//! net.connect(a, b, 1.0).unwrap();
//!
//! net.add_sensory_input(a, 0, 1.0, Sign::Positive).unwrap();
//! let fired = net.step(0).unwrap();
//! assert!(fired.contains(a));
//! assert!(!fired.contains(b));
//! ```

pub mod audio;
pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod neural;
pub mod snapshot;
pub mod stats;
pub mod training;

// Re-export main types
pub use config::Config;
pub use error::{CochleaError, Result};
pub use neural::{Network, NeuronId, Sign};
pub use training::{Trainer, TrainingExample};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time one labeled run of `frames` frames on the default topology
pub fn benchmark(frames: usize, seed: u64) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let config = Config::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut network = config
        .topology()
        .build(config.decay(), config.learning.clone(), &mut rng)?;

    let audio = &config.audio;
    let (_, len) = audio::frame_layout(audio.sample_rate, audio.frame_rate, frames, audio.window_size)?;
    let samples = audio::sine_tone(len, 440.0, audio.sample_rate, audio.tukey_alpha)?;

    let outputs = network.layer_ids(network.layer_count().saturating_sub(1));
    let example = TrainingExample::new(
        &samples,
        audio,
        frames,
        &network.layer_ids(0),
        &outputs[..1.min(outputs.len())],
        &[],
    )?;

    let start = Instant::now();
    let stats = example.run(&mut network, config.training.max_depth, None)?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(BenchmarkResult {
        frames,
        neurons: network.len(),
        total_spikes: stats.total_spikes,
        learn_calls: stats.learn_calls,
        elapsed_secs: elapsed,
        frames_per_second: frames as f64 / elapsed.max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub frames: usize,
    pub neurons: usize,
    pub total_spikes: u64,
    pub learn_calls: u64,
    pub elapsed_secs: f64,
    pub frames_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(f, "Neurons: {}", self.neurons)?;
        writeln!(f, "Spikes: {}", self.total_spikes)?;
        writeln!(f, "Learn passes: {}", self.learn_calls)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} frames/s", self.frames_per_second)?;
        Ok(())
    }
}
