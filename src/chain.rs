//! Three-neuron chain demonstration.
//!
//! `a -> b -> c` with unit weights. `a` receives a pulse train (on for 5
//! frames, off for 10); with enough amplitude the activity walks down the
//! chain one link at a time, never within a single frame.

use crate::error::Result;
use crate::neural::{
    DecayModel, Frame, LearningConfig, Location, Network, NeuronId, Sign, DEFAULT_THRESHOLD,
};
use serde::{Deserialize, Serialize};

/// Pulse period in frames
pub const PULSE_PERIOD: Frame = 15;
/// Frames per period with input on
pub const PULSE_WIDTH: Frame = 5;

/// One printed row: potentials before this frame's input, then who fired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFrame {
    pub frame: Frame,
    pub potentials: [f64; 3],
    pub spiked: [bool; 3],
}

/// The chain network and its three handles
#[derive(Debug, Clone)]
pub struct ChainDemo {
    network: Network,
    chain: [NeuronId; 3],
}

impl ChainDemo {
    pub fn new() -> Result<Self> {
        let mut network = Network::new(DecayModel::default(), LearningConfig::default());
        let a = network.add_neuron(0, DEFAULT_THRESHOLD, Location::new(100.0, 540.0));
        let b = network.add_neuron(1, DEFAULT_THRESHOLD, Location::new(960.0, 540.0));
        let c = network.add_neuron(2, DEFAULT_THRESHOLD, Location::new(1820.0, 540.0));
        network.connect(a, b, 1.0)?;
        network.connect(b, c, 1.0)?;

        Ok(Self {
            network,
            chain: [a, b, c],
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn ids(&self) -> [NeuronId; 3] {
        self.chain
    }

    /// Input to `a` at `frame`
    pub fn pulse(frame: Frame, amplitude: f64) -> f64 {
        if frame % PULSE_PERIOD < PULSE_WIDTH {
            amplitude
        } else {
            0.0
        }
    }

    /// Simulate `frames` frames from a clean state
    pub fn run(&mut self, amplitude: f64, frames: usize) -> Result<Vec<ChainFrame>> {
        self.network.clear_memories();
        let [a, _, _] = self.chain;

        let mut trace = Vec::with_capacity(frames);
        for frame in 0..frames as Frame {
            let mut potentials = [0.0; 3];
            for (slot, &id) in potentials.iter_mut().zip(&self.chain) {
                *slot = self.network.potential(id, frame)?;
            }

            self.network
                .add_sensory_input(a, frame, Self::pulse(frame, amplitude), Sign::Positive)?;
            let spiking = self.network.step(frame)?;

            let spiked = self.chain.map(|id| spiking.contains(id));
            trace.push(ChainFrame {
                frame,
                potentials,
                spiked,
            });
        }

        log::debug!(
            "chain: {} frames, {} spikes",
            frames,
            trace.iter().flat_map(|f| f.spiked).filter(|&s| s).count()
        );
        Ok(trace)
    }
}

/// First frame at which chain position `index` fired
pub fn first_spike(trace: &[ChainFrame], index: usize) -> Option<Frame> {
    trace
        .iter()
        .find(|f| f.spiked.get(index).copied().unwrap_or(false))
        .map(|f| f.frame)
}
