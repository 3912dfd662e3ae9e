//! A single spiking unit: threshold, input weights, output edges and memory.

use super::memory::{Frame, Sign, SpikeEvent, SpikeMemory};
use super::potential::DecayModel;
use crate::error::{CochleaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Default firing threshold on |potential|
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Opaque handle of a neuron inside its [`Network`](super::Network)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeuronId(pub usize);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout position, used only by renderers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Spiking neuron.
///
/// Owns its input weights exclusively; other neurons are referenced by
/// [`NeuronId`] only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    id: NeuronId,
    layer: usize,
    threshold: f64,
    location: Location,
    /// source -> signed weight
    inputs: BTreeMap<NeuronId, f64>,
    outputs: BTreeSet<NeuronId>,
    memory: SpikeMemory,
}

impl Neuron {
    pub fn new(id: NeuronId, layer: usize, threshold: f64, location: Location) -> Self {
        Self {
            id,
            layer,
            threshold,
            location,
            inputs: BTreeMap::new(),
            outputs: BTreeSet::new(),
            memory: SpikeMemory::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NeuronId {
        self.id
    }

    #[inline]
    pub fn layer(&self) -> usize {
        self.layer
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn inputs(&self) -> &BTreeMap<NeuronId, f64> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeSet<NeuronId> {
        &self.outputs
    }

    pub fn memory(&self) -> &SpikeMemory {
        &self.memory
    }

    /// Weight of the connection from `source`, if any
    #[inline]
    pub fn weight(&self, source: NeuronId) -> Option<f64> {
        self.inputs.get(&source).copied()
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut BTreeMap<NeuronId, f64> {
        &mut self.inputs
    }

    // --- topology ---

    /// Add (or replace) an input connection
    pub fn add_input_neuron(&mut self, source: NeuronId, weight: f64) -> Result<()> {
        if source == self.id {
            return Err(CochleaError::SelfLoop { neuron: self.id });
        }
        self.inputs.insert(source, weight);
        Ok(())
    }

    pub fn add_output_neuron(&mut self, target: NeuronId) -> Result<()> {
        if target == self.id {
            return Err(CochleaError::SelfLoop { neuron: self.id });
        }
        self.outputs.insert(target);
        Ok(())
    }

    /// Rescale inputs so that `max(|weight|) == 1`.
    ///
    /// Returns false and leaves the weights untouched when there is nothing
    /// to scale by (no inputs, or every weight zero).
    pub fn normalize_input_weights(&mut self) -> bool {
        let abs_max = self.max_abs_weight();
        if abs_max == 0.0 || !abs_max.is_finite() {
            log::debug!("neuron {}: skipping normalization (max |w| = {})", self.id, abs_max);
            return false;
        }
        for w in self.inputs.values_mut() {
            *w /= abs_max;
        }
        true
    }

    pub fn max_abs_weight(&self) -> f64 {
        self.inputs.values().fold(0.0f64, |m, w| m.max(w.abs()))
    }

    // --- input events ---

    /// Externally injected, unweighted input
    pub fn add_sensory_input(&mut self, now: Frame, amplitude: f64, sign: Sign) {
        self.memory.push(SpikeEvent::sensory(now, amplitude, sign));
    }

    /// Spike delivered by `source`
    pub fn receive_spike(&mut self, now: Frame, source: NeuronId, sign: Sign) {
        self.memory.push(SpikeEvent::from_neuron(now, source, sign));
    }

    /// Forget every remembered event (potential resets to zero)
    pub fn clear_input_spikes(&mut self) {
        self.memory.clear();
    }

    // --- queries ---

    pub fn potential(&self, now: Frame, decay: &DecayModel) -> f64 {
        decay.potential(now, &self.memory, |id| self.weight(id))
    }

    pub fn should_spike(&self, now: Frame, decay: &DecayModel) -> bool {
        self.potential(now, decay).abs() >= self.threshold
    }

    /// Sign of the spike this neuron would emit now, `None` below threshold
    pub fn spike_sign(&self, now: Frame, decay: &DecayModel) -> Option<Sign> {
        let potential = self.potential(now, decay);
        if potential.abs() >= self.threshold {
            Some(Sign::from_bool(potential > 0.0))
        } else {
            None
        }
    }

    /// Potential relative to threshold, clamped to [-1, 1]
    pub fn potential_ratio(&self, now: Frame, decay: &DecayModel) -> f64 {
        (self.potential(now, decay) / self.threshold).clamp(-1.0, 1.0)
    }

    /// Each input weight divided by the largest |weight|
    pub fn weight_ratios(&self) -> Vec<(NeuronId, f64)> {
        let abs_max = self.max_abs_weight();
        self.inputs
            .iter()
            .map(|(&id, &w)| {
                let ratio = if abs_max > 0.0 { w / abs_max } else { 0.0 };
                (id, ratio)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neuron(id: usize) -> Neuron {
        Neuron::new(NeuronId(id), 0, DEFAULT_THRESHOLD, Location::default())
    }

    #[test]
    fn test_self_loop_rejected() {
        for id in 0..5 {
            let mut n = neuron(id);
            assert!(matches!(
                n.add_input_neuron(NeuronId(id), 1.0),
                Err(CochleaError::SelfLoop { .. })
            ));
            assert!(matches!(
                n.add_output_neuron(NeuronId(id)),
                Err(CochleaError::SelfLoop { .. })
            ));
            assert!(n.inputs().is_empty());
            assert!(n.outputs().is_empty());
        }
    }

    #[test]
    fn test_normalize_restores_unit_max() {
        let mut n = neuron(0);
        n.add_input_neuron(NeuronId(1), 0.5).unwrap();
        n.add_input_neuron(NeuronId(2), -2.0).unwrap();
        n.add_input_neuron(NeuronId(3), 1.0).unwrap();

        assert!(n.normalize_input_weights());
        assert!((n.max_abs_weight() - 1.0).abs() < 1e-12);
        assert_eq!(n.weight(NeuronId(2)), Some(-1.0));
        assert_eq!(n.weight(NeuronId(1)), Some(0.25));
    }

    #[test]
    fn test_normalize_all_zero_is_noop() {
        let mut n = neuron(0);
        assert!(!n.normalize_input_weights());

        n.add_input_neuron(NeuronId(1), 0.0).unwrap();
        assert!(!n.normalize_input_weights());
        assert_eq!(n.weight(NeuronId(1)), Some(0.0));
    }

    #[test]
    fn test_spike_decision() {
        let decay = DecayModel::default();
        let mut n = neuron(0);
        n.add_input_neuron(NeuronId(1), -1.0).unwrap();

        n.add_sensory_input(0, 0.4, Sign::Positive);
        assert!(!n.should_spike(0, &decay));
        assert_eq!(n.spike_sign(0, &decay), None);

        // -1 weight times positive spike drives the potential negative
        n.receive_spike(0, NeuronId(1), Sign::Positive);
        n.receive_spike(0, NeuronId(1), Sign::Positive);
        assert!(n.should_spike(0, &decay));
        assert_eq!(n.spike_sign(0, &decay), Some(Sign::Negative));
        assert_eq!(n.potential_ratio(0, &decay), -1.0);

        n.clear_input_spikes();
        assert_eq!(n.potential(0, &decay), 0.0);
    }

    #[test]
    fn test_weight_ratios() {
        let mut n = neuron(0);
        n.add_input_neuron(NeuronId(1), 2.0).unwrap();
        n.add_input_neuron(NeuronId(2), -1.0).unwrap();

        let ratios = n.weight_ratios();
        assert_eq!(ratios, vec![(NeuronId(1), 1.0), (NeuronId(2), -0.5)]);
    }
}
