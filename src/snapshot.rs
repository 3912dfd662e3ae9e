//! Snapshot structures for renderers.
//!
//! The simulation never draws anything itself. Once per frame it can hand a
//! [`FrameSnapshot`] to a [`FrameObserver`]; colour mapping and pixels are
//! the observer's business.

use crate::error::Result;
use crate::neural::{Frame, Location, NeuronId, Sign};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One neuron's renderable state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeuronView {
    pub id: NeuronId,
    pub layer: usize,
    pub location: Location,
    /// Raw, unclamped potential
    pub potential: f64,
    /// potential / threshold, clamped to [-1, 1]
    pub potential_ratio: f64,
    /// (source, weight / max |weight|) for every input
    pub input_weights: Vec<(NeuronId, f64)>,
    /// Sign emitted this frame, if the neuron fired
    pub spike: Option<Sign>,
}

/// Whole network at the end of one frame
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: Frame,
    pub neurons: Vec<NeuronView>,
}

impl FrameSnapshot {
    pub fn spike_count(&self) -> usize {
        self.neurons.iter().filter(|n| n.spike.is_some()).count()
    }
}

/// Receives one snapshot per simulated frame
pub trait FrameObserver {
    fn observe(&mut self, snapshot: &FrameSnapshot);
}

/// Keeps every snapshot in memory, optionally dumping them to JSON
#[derive(Clone, Debug, Default)]
pub struct SnapshotRecorder {
    pub frames: Vec<FrameSnapshot>,
}

impl SnapshotRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Save all frames to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(&self.frames)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl FrameObserver for SnapshotRecorder {
    fn observe(&mut self, snapshot: &FrameSnapshot) {
        self.frames.push(snapshot.clone());
    }
}
