//! Statistics tracking for training and test runs.

use crate::error::Result;
use crate::neural::{Frame, NeuronId, SpikingSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics for one pass over a clip
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Index of the training example, `None` for unlabeled runs
    pub example: Option<usize>,
    /// Frames simulated
    pub frames: u64,
    /// Spikes fired over the whole run
    pub total_spikes: u64,
    /// Spike count per neuron, indexed by id
    pub spikes_per_neuron: Vec<u64>,
    /// Frame of each neuron's first spike, indexed by id
    pub first_spike: Vec<Option<Frame>>,
    /// Learn passes during the run (recursive ones included)
    pub learn_calls: u64,
    /// Sign flips during the run
    pub sign_flips: u64,
}

impl RunStats {
    /// Create empty stats for a network of `neuron_count` neurons
    pub fn new(neuron_count: usize, example: Option<usize>) -> Self {
        Self {
            example,
            spikes_per_neuron: vec![0; neuron_count],
            first_spike: vec![None; neuron_count],
            ..Self::default()
        }
    }

    /// Account for one simulated frame
    pub fn record_frame(&mut self, frame: Frame, spiked: &SpikingSet) {
        self.frames += 1;
        self.total_spikes += spiked.len() as u64;
        for id in spiked.ids() {
            if let Some(count) = self.spikes_per_neuron.get_mut(id.0) {
                *count += 1;
            }
            if let Some(first) = self.first_spike.get_mut(id.0) {
                first.get_or_insert(frame);
            }
        }
    }

    pub fn spikes_of(&self, id: NeuronId) -> u64 {
        self.spikes_per_neuron.get(id.0).copied().unwrap_or(0)
    }

    pub fn first_spike_of(&self, id: NeuronId) -> Option<Frame> {
        self.first_spike.get(id.0).copied().flatten()
    }

    /// Mean spikes per frame
    pub fn spike_rate(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.total_spikes as f64 / self.frames as f64
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        let label = match self.example {
            Some(i) => format!("Ex:{:3}", i),
            None => "Ex:  -".to_string(),
        };
        format!(
            "{} | Frames:{:5} | Spikes:{:6} ({:.2}/frame) | Learn:{:6} | Flips:{:4}",
            label,
            self.frames,
            self.total_spikes,
            self.spike_rate(),
            self.learn_calls,
            self.sign_flips,
        )
    }
}

/// Every run of a training session, in execution order
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub runs: Vec<RunStats>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: RunStats) {
        self.runs.push(stats);
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Runs recorded per example index
    pub fn runs_per_example(&self, example_count: usize) -> Vec<usize> {
        let mut counts = vec![0; example_count];
        for run in &self.runs {
            if let Some(count) = run.example.and_then(|i| counts.get_mut(i)) {
                *count += 1;
            }
        }
        counts
    }

    /// Spikes per run over time
    pub fn spike_series(&self) -> Vec<(usize, u64)> {
        self.runs
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.total_spikes))
            .collect()
    }

    /// Sign flips per run over time
    pub fn flip_series(&self) -> Vec<(usize, u64)> {
        self.runs
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.sign_flips))
            .collect()
    }

    /// Format the whole session as a one-line summary
    pub fn summary(&self) -> String {
        let spikes: u64 = self.runs.iter().map(|r| r.total_spikes).sum();
        let learns: u64 = self.runs.iter().map(|r| r.learn_calls).sum();
        let flips: u64 = self.runs.iter().map(|r| r.sign_flips).sum();
        format!(
            "Runs:{:5} | Spikes:{:8} | Learn:{:8} | Flips:{:6}",
            self.runs.len(),
            spikes,
            learns,
            flips
        )
    }

    /// Save history to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::Sign;

    fn set(ids: &[usize]) -> SpikingSet {
        let mut set = SpikingSet::new();
        for &i in ids {
            set.insert(NeuronId(i), Sign::Positive);
        }
        set
    }

    #[test]
    fn test_record_frame() {
        let mut stats = RunStats::new(3, Some(0));
        stats.record_frame(0, &set(&[]));
        stats.record_frame(1, &set(&[0, 2]));
        stats.record_frame(2, &set(&[2]));

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.total_spikes, 3);
        assert_eq!(stats.spikes_of(NeuronId(2)), 2);
        assert_eq!(stats.first_spike_of(NeuronId(2)), Some(1));
        assert_eq!(stats.first_spike_of(NeuronId(1)), None);
        assert!((stats.spike_rate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_runs_per_example() {
        let mut history = TrainingHistory::new();
        history.record(RunStats::new(1, Some(1)));
        history.record(RunStats::new(1, Some(1)));
        history.record(RunStats::new(1, None));

        assert_eq!(history.runs_per_example(2), vec![0, 2]);
        assert!(history.summary().contains("Runs:    3"));
    }

    #[test]
    fn test_history_json_roundtrip() {
        let mut history = TrainingHistory::new();
        let mut run = RunStats::new(2, Some(0));
        run.record_frame(4, &set(&[1]));
        run.sign_flips = 7;
        history.record(run);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        history.save_json(&path).unwrap();

        let loaded = TrainingHistory::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.runs[0].first_spike_of(NeuronId(1)), Some(4));
        assert_eq!(loaded.flip_series(), vec![(0, 7)]);
    }
}
