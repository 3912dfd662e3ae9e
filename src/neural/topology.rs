//! Reference layered topology: full forward connectivity with random signs.

use super::hebbian::LearningConfig;
use super::network::Network;
use super::neuron::{Location, NeuronId};
use super::potential::DecayModel;
use crate::error::{CochleaError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Image geometry used to place neurons for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// Diameter of a drawn neuron; the border is two of these
    pub node_size: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            node_size: 201,
        }
    }
}

impl Layout {
    /// Grid position of neuron `index` of `layer_len` in `layer` of `layers`
    pub fn place(&self, layer: usize, layers: usize, index: usize, layer_len: usize) -> Location {
        let border = 2.0 * self.node_size as f64;
        let paintable_width = (self.width as f64 - 2.0 * border).max(0.0);
        let paintable_height = (self.height as f64 - 2.0 * border).max(0.0);

        let x_spacing = (paintable_width / layer_len.max(1) as f64).floor();
        let y_spacing = if layers > 1 {
            (paintable_height / (layers - 1) as f64).floor()
        } else {
            0.0
        };

        Location::new(border + x_spacing * index as f64, border + y_spacing * layer as f64)
    }
}

/// Layer sizes plus per-neuron defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredTopology {
    pub layer_sizes: Vec<usize>,
    pub threshold: f64,
    #[serde(default)]
    pub layout: Layout,
}

impl LayeredTopology {
    pub fn new(layer_sizes: Vec<usize>, threshold: f64) -> Self {
        Self {
            layer_sizes,
            threshold,
            layout: Layout::default(),
        }
    }

    /// Build the network.
    ///
    /// Ids are assigned layer by layer. Every neuron of layer L feeds every
    /// neuron of layer L+1 with weight +1 or -1 drawn from `rng`; each
    /// neuron's inputs are then normalized once.
    pub fn build<R: Rng + ?Sized>(
        &self,
        decay: DecayModel,
        learning: LearningConfig,
        rng: &mut R,
    ) -> Result<Network> {
        if self.layer_sizes.is_empty() || self.layer_sizes.contains(&0) {
            return Err(CochleaError::InvalidParameter(format!(
                "layer sizes must be non-empty and positive, got {:?}",
                self.layer_sizes
            )));
        }

        let mut network = Network::new(decay, learning);
        let layers = self.layer_sizes.len();

        let mut by_layer: Vec<Vec<NeuronId>> = Vec::with_capacity(layers);
        for (layer, &size) in self.layer_sizes.iter().enumerate() {
            let ids = (0..size)
                .map(|i| {
                    let location = self.layout.place(layer, layers, i, size);
                    network.add_neuron(layer, self.threshold, location)
                })
                .collect();
            by_layer.push(ids);
        }

        for pair in by_layer.windows(2) {
            for &from in &pair[0] {
                for &to in &pair[1] {
                    let weight = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                    network.connect(from, to, weight)?;
                }
            }
        }

        network.normalize_all();

        log::debug!(
            "built layered network {:?}: {} neurons",
            self.layer_sizes,
            network.len()
        );

        Ok(network)
    }
}
