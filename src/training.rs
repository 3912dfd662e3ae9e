//! Training examples and the training schedule.
//!
//! A [`TrainingExample`] is a clip of audio turned into per-frame sensory
//! events, plus the output neurons that should (or should not) fire while
//! it plays. Running an example drives the network frame by frame: sensory
//! events in, decide-then-fire, then forced learning on the labeled
//! neurons.

use crate::audio::{sine_tone, tone_sequence, Spectrogram};
use crate::config::{AudioConfig, Config};
use crate::error::{CochleaError, Result};
use crate::neural::{Frame, Network, NeuronId, Sign};
use crate::snapshot::FrameObserver;
use crate::stats::{RunStats, TrainingHistory};
use rand::seq::SliceRandom;
use rand::Rng;

/// One labeled (or unlabeled) clip
#[derive(Debug, Clone)]
pub struct TrainingExample {
    spectrogram: Spectrogram,
    sensory: Vec<NeuronId>,
    positive_active: Vec<NeuronId>,
    negative_inactive: Vec<NeuronId>,
}

impl TrainingExample {
    /// Analyse `samples` into `frame_count` frames.
    ///
    /// Bin `i` of each frame feeds `sensory[i]`. A neuron may not appear in
    /// both label sets.
    pub fn new(
        samples: &[i16],
        audio: &AudioConfig,
        frame_count: usize,
        sensory: &[NeuronId],
        positive_active: &[NeuronId],
        negative_inactive: &[NeuronId],
    ) -> Result<Self> {
        if let Some(&neuron) = positive_active
            .iter()
            .find(|id| negative_inactive.contains(id))
        {
            return Err(CochleaError::ConflictingLabel { neuron });
        }
        if sensory.len() > audio.window_size {
            return Err(CochleaError::InvalidParameter(format!(
                "{} sensory neurons but only {} spectrogram bins",
                sensory.len(),
                audio.window_size
            )));
        }

        let spectrogram = Spectrogram::new(
            samples,
            audio.sample_rate,
            audio.frame_rate,
            frame_count,
            audio.window_size,
        )?;

        Ok(Self {
            spectrogram,
            sensory: sensory.to_vec(),
            positive_active: positive_active.to_vec(),
            negative_inactive: negative_inactive.to_vec(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.spectrogram.frame_count()
    }

    pub fn spectrogram(&self) -> &Spectrogram {
        &self.spectrogram
    }

    pub fn sensory(&self) -> &[NeuronId] {
        &self.sensory
    }

    pub fn positive_active(&self) -> &[NeuronId] {
        &self.positive_active
    }

    pub fn negative_inactive(&self) -> &[NeuronId] {
        &self.negative_inactive
    }

    pub fn is_labeled(&self) -> bool {
        !self.positive_active.is_empty() || !self.negative_inactive.is_empty()
    }

    /// Play the clip through `network`.
    ///
    /// Memories are cleared first; earlier runs have no influence. Labeled
    /// neurons never fire on their own, they only learn.
    pub fn run(
        &self,
        network: &mut Network,
        max_depth: usize,
        mut observer: Option<&mut dyn FrameObserver>,
    ) -> Result<RunStats> {
        network.clear_memories();
        let learn_before = network.learning_stats().clone();
        let mut stats = RunStats::new(network.len(), None);

        for frame_index in 0..self.frame_count() {
            let frame = frame_index as Frame;

            // Phase 1: sensory events for this frame
            let bins = self.spectrogram.frame(frame_index).ok_or_else(|| {
                CochleaError::InvalidParameter(format!("frame {} outside spectrogram", frame_index))
            })?;
            for (&id, &amplitude) in self.sensory.iter().zip(bins.iter()) {
                network.add_sensory_input(id, frame, amplitude, Sign::Positive)?;
            }

            // Phase 2: decide, drop labeled neurons, fire
            let mut spiking = network.compute_spiking_set(frame);
            for id in self.positive_active.iter().chain(&self.negative_inactive) {
                spiking.remove(*id);
            }
            network.fire_all(frame, &spiking)?;

            // Phase 3: forced learning
            for &id in &self.positive_active {
                network.learn(id, frame, Sign::Positive, max_depth)?;
            }
            for &id in &self.negative_inactive {
                network.learn(id, frame, Sign::Negative, max_depth)?;
            }

            stats.record_frame(frame, &spiking);
            if let Some(observer) = observer.as_deref_mut() {
                observer.observe(&network.snapshot(frame, &spiking));
            }
        }

        let learn_after = network.learning_stats();
        stats.learn_calls = learn_after.learn_calls - learn_before.learn_calls;
        stats.sign_flips = learn_after.sign_flips - learn_before.sign_flips;
        Ok(stats)
    }
}

/// Runs each example a fixed number of times in random order
#[derive(Debug, Clone)]
pub struct Trainer {
    pub runs_per_example: usize,
    pub max_depth: usize,
    /// Runs between progress lines (0 disables them)
    pub stats_interval: usize,
}

impl Trainer {
    pub fn new(runs_per_example: usize, max_depth: usize) -> Self {
        Self {
            runs_per_example,
            max_depth,
            stats_interval: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            runs_per_example: config.training.runs_per_example,
            max_depth: config.training.max_depth,
            stats_interval: config.logging.stats_interval,
        }
    }

    pub fn with_stats_interval(mut self, stats_interval: usize) -> Self {
        self.stats_interval = stats_interval;
        self
    }

    /// Train until every example has run `runs_per_example` times.
    ///
    /// Each run picks uniformly among the examples that have not reached
    /// their quota yet.
    pub fn train<R: Rng + ?Sized>(
        &self,
        network: &mut Network,
        examples: &[TrainingExample],
        rng: &mut R,
    ) -> Result<TrainingHistory> {
        let mut history = TrainingHistory::new();
        if examples.is_empty() {
            log::warn!("no training examples; nothing to do");
            return Ok(history);
        }

        let total_runs = self.runs_per_example * examples.len();
        let mut counts = vec![0usize; examples.len()];
        log::info!(
            "training {} examples x {} runs (depth {})",
            examples.len(),
            self.runs_per_example,
            self.max_depth
        );

        for run in 0..total_runs {
            let open: Vec<usize> = (0..examples.len())
                .filter(|&i| counts[i] < self.runs_per_example)
                .collect();
            let pick = *open.choose(rng).ok_or_else(|| {
                CochleaError::InvalidParameter("every example reached its quota early".to_string())
            })?;

            let mut stats = examples[pick].run(network, self.max_depth, None)?;
            stats.example = Some(pick);
            counts[pick] += 1;

            if self.stats_interval > 0 && (run + 1) % self.stats_interval == 0 {
                log::info!("run {:5}/{} {}", run + 1, total_runs, stats.summary());
            }
            history.record(stats);
        }

        if !network.is_valid() {
            log::warn!("non-finite weights after training");
        }
        log::info!("training done: {}", history.summary());
        Ok(history)
    }
}

fn output_layer(network: &Network) -> Result<Vec<NeuronId>> {
    let layers = network.layer_count();
    if layers == 0 {
        return Err(CochleaError::InvalidParameter("network has no neurons".to_string()));
    }
    Ok(network.layer_ids(layers - 1))
}

/// One example per configured tone; tone `i` labels output neuron `i`
pub fn tone_examples(network: &Network, config: &Config) -> Result<Vec<TrainingExample>> {
    let sensory = network.layer_ids(0);
    let outputs = output_layer(network)?;
    let audio = &config.audio;
    let len = audio.samples_for(audio.training_seconds);

    audio
        .tones
        .iter()
        .enumerate()
        .map(|(i, &frequency)| {
            let target = *outputs.get(i).ok_or_else(|| {
                CochleaError::InvalidParameter(format!(
                    "tone {} has no output neuron ({} outputs)",
                    i,
                    outputs.len()
                ))
            })?;
            log::debug!("example {}: {} Hz -> neuron {}", i, frequency, target);

            let samples = sine_tone(len, frequency, audio.sample_rate, audio.tukey_alpha)?;
            TrainingExample::new(
                &samples,
                audio,
                config.training.frames_per_example,
                &sensory,
                &[target],
                &[],
            )
        })
        .collect()
}

/// Unlabeled clip of every tone played in sequence
pub fn test_example(network: &Network, config: &Config) -> Result<TrainingExample> {
    let audio = &config.audio;
    let samples = tone_sequence(
        &audio.tones,
        audio.samples_for(audio.test_seconds),
        audio.sample_rate,
        audio.tukey_alpha,
    )?;
    TrainingExample::new(
        &samples,
        audio,
        config.training.test_frames,
        &network.layer_ids(0),
        &[],
        &[],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{DecayModel, LearningConfig, Location, DEFAULT_THRESHOLD};
    use crate::snapshot::SnapshotRecorder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dc_audio() -> AudioConfig {
        AudioConfig {
            sample_rate: 80.0,
            frame_rate: 10.0,
            window_size: 8,
            ..AudioConfig::default()
        }
    }

    /// a -> b with weight +1
    fn pair() -> (Network, NeuronId, NeuronId) {
        let mut net = Network::new(DecayModel::default(), LearningConfig::default());
        let a = net.add_neuron(0, DEFAULT_THRESHOLD, Location::default());
        let b = net.add_neuron(1, DEFAULT_THRESHOLD, Location::default());
        net.connect(a, b, 1.0).unwrap();
        (net, a, b)
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.audio.sample_rate = 800.0;
        config.audio.window_size = 16;
        config.audio.tones = vec![100.0, 200.0];
        config.audio.training_seconds = 1.0;
        config.audio.test_seconds = 2.0;
        config.topology.layer_sizes = vec![8, 8, 2];
        config.training.frames_per_example = 5;
        config.training.test_frames = 10;
        config
    }

    #[test]
    fn test_conflicting_label_rejected() {
        let samples = vec![1000i16; 64];
        let err = TrainingExample::new(
            &samples,
            &dc_audio(),
            2,
            &[NeuronId(0)],
            &[NeuronId(1), NeuronId(2)],
            &[NeuronId(2)],
        )
        .unwrap_err();
        assert!(matches!(err, CochleaError::ConflictingLabel { neuron: NeuronId(2) }));
    }

    #[test]
    fn test_more_sensory_neurons_than_bins_rejected() {
        let samples = vec![1000i16; 64];
        let sensory: Vec<NeuronId> = (0..9).map(NeuronId).collect();
        let err = TrainingExample::new(&samples, &dc_audio(), 2, &sensory, &[], &[]).unwrap_err();
        assert!(matches!(err, CochleaError::InvalidParameter(_)));
    }

    #[test]
    fn test_unlabeled_run_propagates() {
        let (mut net, a, b) = pair();
        let samples = vec![1000i16; 64];
        let example = TrainingExample::new(&samples, &dc_audio(), 5, &[a], &[], &[]).unwrap();

        let mut recorder = SnapshotRecorder::new();
        let stats = example.run(&mut net, 3, Some(&mut recorder)).unwrap();

        // DC bin is the loudest bin, so a sees 1.0 every frame
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.spikes_of(a), 5);
        assert_eq!(stats.first_spike_of(a), Some(0));
        assert_eq!(stats.first_spike_of(b), Some(2));
        assert_eq!(stats.learn_calls, 0);
        assert_eq!(recorder.len(), 5);
        assert_eq!(recorder.frames[2].neurons[b.0].spike, Some(Sign::Positive));
    }

    #[test]
    fn test_labeled_neuron_only_learns() {
        let (mut net, a, b) = pair();
        let samples = vec![1000i16; 64];
        let example = TrainingExample::new(&samples, &dc_audio(), 5, &[a], &[b], &[]).unwrap();
        assert!(example.is_labeled());

        let stats = example.run(&mut net, 0, None).unwrap();
        assert_eq!(stats.spikes_of(b), 0);
        assert_eq!(stats.spikes_of(a), 5);
        assert_eq!(stats.learn_calls, 5);

        let stats = example.run(&mut net, 1, None).unwrap();
        assert_eq!(stats.learn_calls, 10);
        assert_eq!(net.neuron(b).unwrap().weight(a), Some(1.0));
    }

    #[test]
    fn test_trainer_meets_quota() {
        let config = small_config();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut net = config
            .topology()
            .build(config.decay(), config.learning.clone(), &mut rng)
            .unwrap();
        let examples = tone_examples(&net, &config).unwrap();
        assert_eq!(examples.len(), 2);

        let history = Trainer::new(3, 2).train(&mut net, &examples, &mut rng).unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history.runs_per_example(2), vec![3, 3]);
        assert!(net.is_valid());
    }

    #[test]
    fn test_tone_examples_label_outputs_in_order() {
        let config = small_config();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let net = config
            .topology()
            .build(config.decay(), config.learning.clone(), &mut rng)
            .unwrap();

        let outputs = net.layer_ids(2);
        let examples = tone_examples(&net, &config).unwrap();
        for (i, example) in examples.iter().enumerate() {
            assert_eq!(example.positive_active(), &[outputs[i]]);
            assert!(example.negative_inactive().is_empty());
            assert_eq!(example.sensory().len(), 8);
            assert_eq!(example.frame_count(), 5);
        }

        let test = test_example(&net, &config).unwrap();
        assert!(!test.is_labeled());
        assert_eq!(test.frame_count(), 10);
    }

    #[test]
    fn test_empty_example_list() {
        let (mut net, _, _) = pair();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let history = Trainer::new(5, 3).train(&mut net, &[], &mut rng).unwrap();
        assert!(history.is_empty());
    }
}
