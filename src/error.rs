//! Error types for cochlea.

use crate::neural::NeuronId;
use thiserror::Error;

/// Crate-wide error type.
///
/// Every variant is a contract violation by the caller or a persistence
/// failure; nothing here is retried.
#[derive(Debug, Error)]
pub enum CochleaError {
    /// An edge from a neuron to itself was requested
    #[error("self loops are not allowed (neuron {neuron})")]
    SelfLoop { neuron: NeuronId },

    /// A neuron was labeled both positive-active and negative-inactive
    #[error("neuron {neuron} cannot be labeled positive and negative in the same example")]
    ConflictingLabel { neuron: NeuronId },

    /// Handle does not belong to this network
    #[error("unknown neuron: {0}")]
    UnknownNeuron(NeuronId),

    /// FFT input length is not a power of two
    #[error("FFT length {0} is not a power of 2")]
    NotPowerOfTwo(usize),

    /// Tukey window index outside [0, len)
    #[error("window index out of bounds: {n} / {len}")]
    WindowIndexOutOfRange { n: usize, len: usize },

    /// Tukey taper parameter outside [0, 1]
    #[error("tukey alpha must be in [0, 1], got {0}")]
    InvalidAlpha(f64),

    /// Sample buffer too short for the requested spectrogram
    #[error("sample buffer underrun: need {needed} samples, have {available}")]
    SampleUnderrun { needed: usize, available: usize },

    /// Any other out-of-domain argument
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary (checkpoint) encoding error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// YAML configuration error
    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON stats/snapshot error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// File does not look like one of ours
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Checkpoint written by an incompatible version
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub type Result<T> = std::result::Result<T, CochleaError>;
