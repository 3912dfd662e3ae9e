//! Neuron arena, topology mutation and the two-phase spike pass.

use super::hebbian::{LearningConfig, LearningStats};
use super::memory::{Frame, Sign};
use super::neuron::{Location, Neuron, NeuronId};
use super::potential::DecayModel;
use crate::error::{CochleaError, Result};
use crate::snapshot::{FrameSnapshot, NeuronView};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Neurons chosen to fire in one frame, with the sign each will emit.
///
/// Built by [`Network::compute_spiking_set`] against start-of-frame memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpikingSet {
    decisions: BTreeMap<NeuronId, Sign>,
}

impl SpikingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NeuronId, sign: Sign) {
        self.decisions.insert(id, sign);
    }

    /// Drop a candidate (e.g. a neuron whose output is forced by a label)
    pub fn remove(&mut self, id: NeuronId) -> Option<Sign> {
        self.decisions.remove(&id)
    }

    pub fn contains(&self, id: NeuronId) -> bool {
        self.decisions.contains_key(&id)
    }

    pub fn sign(&self, id: NeuronId) -> Option<Sign> {
        self.decisions.get(&id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.decisions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NeuronId, Sign)> + '_ {
        self.decisions.iter().map(|(&id, &s)| (id, s))
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Directed graph of neurons stored as an arena.
///
/// Edges are handle lists on each neuron. Any graph shape is legal here,
/// including cycles through several neurons; only self loops are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub(super) neurons: Vec<Neuron>,
    pub(super) decay: DecayModel,
    pub(super) learning: LearningConfig,
    #[serde(default)]
    pub(super) stats: LearningStats,
}

impl Network {
    pub fn new(decay: DecayModel, learning: LearningConfig) -> Self {
        Self {
            neurons: Vec::new(),
            decay,
            learning,
            stats: LearningStats::default(),
        }
    }

    // --- construction ---

    /// Append a neuron and return its handle
    pub fn add_neuron(&mut self, layer: usize, threshold: f64, location: Location) -> NeuronId {
        let id = NeuronId(self.neurons.len());
        self.neurons.push(Neuron::new(id, layer, threshold, location));
        id
    }

    /// Add the edge `from -> to` on both endpoints
    pub fn connect(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> Result<()> {
        if from == to {
            return Err(CochleaError::SelfLoop { neuron: from });
        }
        self.neuron(to)?;
        self.neuron_mut(from)?.add_output_neuron(to)?;
        self.neuron_mut(to)?.add_input_neuron(from, weight)
    }

    /// Normalize every neuron's inputs; returns how many were rescaled
    pub fn normalize_all(&mut self) -> usize {
        self.neurons
            .iter_mut()
            .filter_map(|n| n.normalize_input_weights().then_some(()))
            .count()
    }

    // --- access ---

    pub fn neuron(&self, id: NeuronId) -> Result<&Neuron> {
        self.neurons.get(id.0).ok_or(CochleaError::UnknownNeuron(id))
    }

    pub fn neuron_mut(&mut self, id: NeuronId) -> Result<&mut Neuron> {
        self.neurons.get_mut(id.0).ok_or(CochleaError::UnknownNeuron(id))
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn ids(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.neurons.iter().map(|n| n.id())
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// Ids of all neurons in `layer`, in creation order
    pub fn layer_ids(&self, layer: usize) -> Vec<NeuronId> {
        self.neurons
            .iter()
            .filter(|n| n.layer() == layer)
            .map(|n| n.id())
            .collect()
    }

    pub fn layer_count(&self) -> usize {
        self.neurons.iter().map(|n| n.layer() + 1).max().unwrap_or(0)
    }

    pub fn decay(&self) -> &DecayModel {
        &self.decay
    }

    pub fn learning(&self) -> &LearningConfig {
        &self.learning
    }

    pub fn learning_stats(&self) -> &LearningStats {
        &self.stats
    }

    pub fn reset_learning_stats(&mut self) {
        self.stats = LearningStats::default();
    }

    /// Check that no weight has become NaN/Inf
    pub fn is_valid(&self) -> bool {
        self.neurons
            .iter()
            .all(|n| n.inputs().values().all(|w| w.is_finite()))
    }

    // --- events ---

    pub fn add_sensory_input(
        &mut self,
        id: NeuronId,
        frame: Frame,
        amplitude: f64,
        sign: Sign,
    ) -> Result<()> {
        self.neuron_mut(id)?.add_sensory_input(frame, amplitude, sign);
        Ok(())
    }

    pub fn receive_spike(
        &mut self,
        id: NeuronId,
        frame: Frame,
        source: NeuronId,
        sign: Sign,
    ) -> Result<()> {
        self.neuron(source)?;
        self.neuron_mut(id)?.receive_spike(frame, source, sign);
        Ok(())
    }

    /// Start of a run: past events are irrelevant
    pub fn clear_memories(&mut self) {
        for n in &mut self.neurons {
            n.clear_input_spikes();
        }
    }

    // --- queries ---

    pub fn potential(&self, id: NeuronId, frame: Frame) -> Result<f64> {
        Ok(self.neuron(id)?.potential(frame, &self.decay))
    }

    pub fn should_spike(&self, id: NeuronId, frame: Frame) -> Result<bool> {
        Ok(self.neuron(id)?.should_spike(frame, &self.decay))
    }

    pub fn spike_sign(&self, id: NeuronId, frame: Frame) -> Result<Option<Sign>> {
        Ok(self.neuron(id)?.spike_sign(frame, &self.decay))
    }

    pub fn threshold(&self, id: NeuronId) -> Result<f64> {
        Ok(self.neuron(id)?.threshold())
    }

    pub fn layer(&self, id: NeuronId) -> Result<usize> {
        Ok(self.neuron(id)?.layer())
    }

    // --- two-phase spike pass ---

    /// Phase 1: decide who fires this frame.
    ///
    /// Read-only; every decision sees the same memory state.
    pub fn compute_spiking_set(&self, frame: Frame) -> SpikingSet {
        let decay = self.decay;
        let decisions = self
            .neurons
            .par_iter()
            .filter_map(|n| n.spike_sign(frame, &decay).map(|sign| (n.id(), sign)))
            .collect::<Vec<_>>();

        SpikingSet {
            decisions: decisions.into_iter().collect(),
        }
    }

    /// Phase 2: fire every neuron in `set`.
    ///
    /// All firing neurons are reset first, then every spike is delivered, so
    /// the result does not depend on firing order. Returns the spike count.
    pub fn fire_all(&mut self, frame: Frame, set: &SpikingSet) -> Result<usize> {
        for id in set.ids() {
            self.neuron_mut(id)?.clear_input_spikes();
        }

        for (id, sign) in set.iter() {
            let targets: Vec<NeuronId> = self.neuron(id)?.outputs().iter().copied().collect();
            for target in targets {
                self.neuron_mut(target)?.receive_spike(frame, id, sign);
            }
        }

        Ok(set.len())
    }

    /// Fire a single neuron immediately with its current sign, if it is at
    /// threshold.
    ///
    /// Below threshold nothing is delivered, memory is kept and `None` is
    /// returned. A neuron with no spike sign never sends a spike. To fire a
    /// chosen sign regardless of potential, call `fire_all` with a one-entry
    /// `SpikingSet`.
    pub fn try_spike_out(&mut self, id: NeuronId, frame: Frame) -> Result<Option<Sign>> {
        let sign = match self.spike_sign(id, frame)? {
            Some(s) => s,
            None => return Ok(None),
        };
        let mut set = SpikingSet::new();
        set.insert(id, sign);
        self.fire_all(frame, &set)?;
        Ok(Some(sign))
    }

    /// Both phases with no exclusions
    pub fn step(&mut self, frame: Frame) -> Result<SpikingSet> {
        let set = self.compute_spiking_set(frame);
        self.fire_all(frame, &set)?;
        Ok(set)
    }

    // --- rendering contract ---

    /// Per-neuron state for a renderer
    pub fn snapshot(&self, frame: Frame, spiked: &SpikingSet) -> FrameSnapshot {
        let neurons = self
            .neurons
            .iter()
            .map(|n| NeuronView {
                id: n.id(),
                layer: n.layer(),
                location: n.location(),
                potential: n.potential(frame, &self.decay),
                potential_ratio: n.potential_ratio(frame, &self.decay),
                input_weights: n.weight_ratios(),
                spike: spiked.sign(n.id()),
            })
            .collect();

        FrameSnapshot { frame, neurons }
    }
}
