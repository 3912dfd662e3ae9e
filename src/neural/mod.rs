//! Spiking network core.
//!
//! Implements:
//! - Time-decayed spike memory and potential
//! - Neurons with signed input weights and self-loop-free edges
//! - An arena network with an explicit decide-then-fire spike pass
//! - Recency-windowed Hebbian learning with depth-bounded recursion

mod memory;
mod network;
mod neuron;
mod potential;
pub mod hebbian;
pub mod topology;

pub use hebbian::{LearningConfig, LearningStats};
pub use memory::{Frame, Sign, SpikeEvent, SpikeMemory, SpikeSource};
pub use network::{Network, SpikingSet};
pub use neuron::{Location, Neuron, NeuronId, DEFAULT_THRESHOLD};
pub use potential::DecayModel;
pub use topology::{LayeredTopology, Layout};
