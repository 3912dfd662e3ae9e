//! Recency-windowed Hebbian learning with bounded upstream credit assignment.
//!
//! "Inputs that fired in agreement with the target get stronger." A learn
//! pass tallies how often each input's recent spikes helped or hurt the
//! requested spike sign, rescales the weights multiplicatively, flips the
//! weakest input when it has collapsed, renormalizes, and then recurses into
//! the inputs that pushed in the target direction.

use super::memory::{Frame, Sign};
use super::network::Network;
use super::neuron::{Neuron, NeuronId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Learning constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Multiplicative step per unit of helpfulness (> 1)
    pub coefficient: f64,
    /// Weakest input is sign-flipped when its |weight| drops below this
    pub flip_floor: f64,
    /// Spikes younger than the age at which decay reaches this fraction
    /// are eligible for credit
    #[serde(default = "default_recency_fraction")]
    pub recency_fraction: f64,
}

fn default_recency_fraction() -> f64 {
    0.5
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            coefficient: 1.1,
            flip_floor: 0.1,
            recency_fraction: 0.5,
        }
    }
}

impl LearningConfig {
    /// `weight * coefficient^helpfulness`
    #[inline]
    pub fn rescale(&self, weight: f64, helpfulness: i32) -> f64 {
        weight * self.coefficient.powi(helpfulness)
    }
}

/// Counters over every learn pass, recursive ones included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub learn_calls: u64,
    pub weight_updates: u64,
    pub sign_flips: u64,
}

impl LearningStats {
    /// Fraction of learn passes that ended in a sign flip
    pub fn flip_rate(&self) -> f64 {
        if self.learn_calls == 0 {
            return 0.0;
        }
        self.sign_flips as f64 / self.learn_calls as f64
    }
}

/// Per-input tallies for one learn pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputTally {
    /// +1 per helpful recent spike, -1 per harmful one
    pub helpfulness: i32,
    /// +1 per helpful spike under a positive target, -1 under a negative one
    pub direction: i32,
}

/// Classify the recent neuron-sourced spikes in `neuron`'s memory.
///
/// Every input starts at zero. Spikes from neurons that are not inputs are
/// ignored.
pub fn tally_inputs(
    neuron: &Neuron,
    now: Frame,
    cutoff: f64,
    target: Sign,
) -> BTreeMap<NeuronId, InputTally> {
    let mut tallies: BTreeMap<NeuronId, InputTally> = neuron
        .inputs()
        .keys()
        .map(|&id| (id, InputTally::default()))
        .collect();

    for (source, spike) in neuron.memory().recent_neuron_events(now, cutoff) {
        let weight_positive = match neuron.weight(source) {
            Some(w) => w > 0.0,
            None => continue,
        };
        let agrees = spike.is_positive() == weight_positive;
        let Some(tally) = tallies.get_mut(&source) else {
            continue;
        };

        match (target, agrees) {
            // product of spike and weight is positive: pushed towards +
            (Sign::Positive, true) => {
                tally.helpfulness += 1;
                tally.direction += 1;
            }
            (Sign::Positive, false) => tally.helpfulness -= 1,
            (Sign::Negative, false) => {
                tally.helpfulness += 1;
                tally.direction -= 1;
            }
            (Sign::Negative, true) => tally.helpfulness -= 1,
        }
    }

    tallies
}

/// Constants shared by every level of one learn call
struct LearnPass {
    learning: LearningConfig,
    cutoff: f64,
    now: Frame,
    max_depth: usize,
}

impl Network {
    /// Teach `id` that it should have spiked with sign `target` at `now`.
    ///
    /// Mutates only input weights (of `id` and of the upstream neurons the
    /// recursion reaches). Recursion stops at `max_depth`; a cycle may be
    /// revisited at increasing depths.
    pub fn learn(&mut self, id: NeuronId, now: Frame, target: Sign, max_depth: usize) -> Result<()> {
        let pass = LearnPass {
            learning: self.learning.clone(),
            cutoff: self.decay.recent_cutoff(self.learning.recency_fraction),
            now,
            max_depth,
        };
        self.learn_at(&pass, id, target, 0)
    }

    fn learn_at(&mut self, pass: &LearnPass, id: NeuronId, target: Sign, depth: usize) -> Result<()> {
        let learning = &pass.learning;
        let tallies = tally_inputs(self.neuron(id)?, pass.now, pass.cutoff, target);

        let neuron = self.neuron_mut(id)?;
        let inputs = neuron.inputs_mut();

        let mut weakest: Option<(NeuronId, f64)> = None;
        let mut updates = 0u64;
        for (&source, tally) in &tallies {
            let Some(weight) = inputs.get_mut(&source) else {
                continue;
            };
            if tally.helpfulness != 0 {
                updates += 1;
            }
            *weight = learning.rescale(*weight, tally.helpfulness);

            let magnitude = weight.abs();
            if weakest.map_or(true, |(_, m)| magnitude < m) {
                weakest = Some((source, magnitude));
            }
        }

        // a weight stuck near zero gets a chance on the other side
        let mut flipped = None;
        if let Some((source, magnitude)) = weakest {
            if magnitude < learning.flip_floor {
                if let Some(weight) = inputs.get_mut(&source) {
                    *weight = -*weight;
                    flipped = Some(source);
                }
            }
        }

        neuron.normalize_input_weights();

        self.stats.learn_calls += 1;
        self.stats.weight_updates += updates;
        if flipped.is_some() {
            self.stats.sign_flips += 1;
        }
        log::debug!(
            "learn n{} depth {} target {:?}: {} updated, flipped {:?}",
            id,
            depth,
            target,
            updates,
            flipped
        );

        if depth < pass.max_depth {
            for (source, tally) in tallies {
                if tally.direction > 0 {
                    self.learn_at(pass, source, Sign::Positive, depth + 1)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::neuron::{Location, DEFAULT_THRESHOLD};
    use crate::neural::potential::DecayModel;

    fn network(n: usize) -> (Network, Vec<NeuronId>) {
        let mut net = Network::new(DecayModel::default(), LearningConfig::default());
        let ids = (0..n)
            .map(|i| net.add_neuron(i, DEFAULT_THRESHOLD, Location::default()))
            .collect();
        (net, ids)
    }

    fn weight(net: &Network, to: NeuronId, from: NeuronId) -> f64 {
        net.neuron(to).unwrap().weight(from).unwrap()
    }

    #[test]
    fn test_no_recent_spikes_leaves_weights() {
        let (mut net, ids) = network(3);
        net.connect(ids[0], ids[2], 1.0).unwrap();
        net.connect(ids[1], ids[2], -0.5).unwrap();
        // sensory and stale spikes do not count
        net.add_sensory_input(ids[2], 10, 1.0, Sign::Positive).unwrap();
        net.receive_spike(ids[2], 0, ids[0], Sign::Positive).unwrap();

        net.learn(ids[2], 10, Sign::Positive, 3).unwrap();

        assert_eq!(weight(&net, ids[2], ids[0]), 1.0);
        assert_eq!(weight(&net, ids[2], ids[1]), -0.5);
        assert_eq!(net.learning_stats().learn_calls, 1);
        assert_eq!(net.learning_stats().weight_updates, 0);
    }

    #[test]
    fn test_positive_target_rewards_agreeing_input() {
        let (mut net, ids) = network(3);
        net.connect(ids[0], ids[2], 1.0).unwrap();
        net.connect(ids[1], ids[2], 0.5).unwrap();
        net.receive_spike(ids[2], 5, ids[0], Sign::Negative).unwrap();
        net.receive_spike(ids[2], 5, ids[1], Sign::Positive).unwrap();

        net.learn(ids[2], 6, Sign::Positive, 0).unwrap();

        // 1.0 / 1.1 and 0.5 * 1.1, renormalized by 1 / 1.1
        let w0 = weight(&net, ids[2], ids[0]);
        let w1 = weight(&net, ids[2], ids[1]);
        assert!((w0 - 1.0).abs() < 1e-12);
        assert!((w1 - 0.5 * 1.1 * 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_negative_target_tally() {
        let (mut net, ids) = network(3);
        net.connect(ids[0], ids[2], 1.0).unwrap();
        net.connect(ids[1], ids[2], -1.0).unwrap();
        net.receive_spike(ids[2], 5, ids[0], Sign::Negative).unwrap();
        net.receive_spike(ids[2], 5, ids[1], Sign::Negative).unwrap();

        let neuron = net.neuron(ids[2]).unwrap();
        let tallies = tally_inputs(neuron, 5, 6.93, Sign::Negative);

        // negative spike on positive weight helped a negative spike
        assert_eq!(tallies[&ids[0]], InputTally { helpfulness: 1, direction: -1 });
        // negative spike on negative weight pushed positive
        assert_eq!(tallies[&ids[1]], InputTally { helpfulness: -1, direction: 0 });
    }

    #[test]
    fn test_weakest_input_flips_sign() {
        let (mut net, ids) = network(3);
        net.connect(ids[0], ids[2], 1.0).unwrap();
        net.connect(ids[1], ids[2], 0.105).unwrap();
        net.receive_spike(ids[2], 5, ids[1], Sign::Positive).unwrap();

        // same-sign spike under a negative target is harmful: 0.105 / 1.1 < 0.1
        net.learn(ids[2], 5, Sign::Negative, 0).unwrap();

        let w1 = weight(&net, ids[2], ids[1]);
        assert!(w1 < 0.0);
        assert!((w1.abs() - 0.105 / 1.1).abs() < 1e-12);
        assert_eq!(weight(&net, ids[2], ids[0]), 1.0);
        assert_eq!(net.learning_stats().sign_flips, 1);
    }

    #[test]
    fn test_recursion_bounded_by_depth() {
        let (mut net, ids) = network(3);
        net.connect(ids[0], ids[1], 1.0).unwrap();
        net.connect(ids[1], ids[2], 1.0).unwrap();
        net.receive_spike(ids[1], 4, ids[0], Sign::Positive).unwrap();
        net.receive_spike(ids[2], 5, ids[1], Sign::Positive).unwrap();

        let mut shallow = net.clone();
        shallow.learn(ids[2], 5, Sign::Positive, 0).unwrap();
        assert_eq!(shallow.learning_stats().learn_calls, 1);

        net.learn(ids[2], 5, Sign::Positive, 10).unwrap();
        // 2 -> 1 -> 0, and 0 has no inputs to recurse into
        assert_eq!(net.learning_stats().learn_calls, 3);
    }

    #[test]
    fn test_cycle_terminates_at_max_depth() {
        let (mut net, ids) = network(2);
        net.connect(ids[0], ids[1], 1.0).unwrap();
        net.connect(ids[1], ids[0], 1.0).unwrap();
        net.receive_spike(ids[0], 3, ids[1], Sign::Positive).unwrap();
        net.receive_spike(ids[1], 3, ids[0], Sign::Positive).unwrap();

        net.learn(ids[0], 3, Sign::Positive, 4).unwrap();

        // 0, 1, 0, 1, 0
        assert_eq!(net.learning_stats().learn_calls, 5);
        assert!(net.is_valid());
    }

    #[test]
    fn test_negative_direction_does_not_recurse() {
        let (mut net, ids) = network(2);
        net.connect(ids[0], ids[1], 1.0).unwrap();
        net.receive_spike(ids[1], 3, ids[0], Sign::Negative).unwrap();

        net.learn(ids[1], 3, Sign::Negative, 5).unwrap();
        assert_eq!(net.learning_stats().learn_calls, 1);
    }

    #[test]
    fn test_flip_rate() {
        let stats = LearningStats {
            learn_calls: 4,
            weight_updates: 9,
            sign_flips: 1,
        };
        assert!((stats.flip_rate() - 0.25).abs() < 1e-12);
        assert_eq!(LearningStats::default().flip_rate(), 0.0);
    }
}
