//! Membrane potential from an exponentially decayed spike history.

use super::memory::{Frame, SpikeMemory, SpikeSource};
use super::neuron::NeuronId;
use serde::{Deserialize, Serialize};

/// Exponential decay applied to every remembered contribution.
///
/// A contribution recorded at `t0` is worth `exp(-k * (now - t0))` of its
/// original size at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayModel {
    pub coefficient: f64,
}

impl Default for DecayModel {
    fn default() -> Self {
        Self { coefficient: 0.1 }
    }
}

impl DecayModel {
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }

    /// Multiplier for a contribution `dt` frames old
    #[inline]
    pub fn factor(&self, dt: f64) -> f64 {
        (-self.coefficient * dt).exp()
    }

    /// Age at which a contribution has decayed to `fraction` of its size.
    ///
    /// With `fraction = 0.5` this is the half-life used as the learning
    /// recency window.
    pub fn recent_cutoff(&self, fraction: f64) -> f64 {
        (-1.0 / self.coefficient) * fraction.ln()
    }

    /// Sum of decayed contributions in `memory` at time `now`.
    ///
    /// `weight_of` maps a source neuron to the receiver's input weight;
    /// sources it does not know contribute nothing. Not clamped.
    pub fn potential<F>(&self, now: Frame, memory: &SpikeMemory, weight_of: F) -> f64
    where
        F: Fn(NeuronId) -> Option<f64>,
    {
        memory
            .iter()
            .map(|e| {
                let amplitude = match e.source {
                    SpikeSource::Sensory { amplitude } => amplitude,
                    SpikeSource::Neuron(id) => weight_of(id).unwrap_or(0.0),
                };
                let dt = now as f64 - e.time as f64;
                amplitude * e.sign.value() * self.factor(dt)
            })
            .sum()
    }
}
