//! Checkpoint system for saving and loading trained networks.

use crate::config::Config;
use crate::error::{CochleaError, Result};
use crate::neural::Network;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"CCHL";

/// A network together with what produced it
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Configuration the network was built and trained with
    pub config: Config,
    /// Trained network (weights, thresholds, layout)
    pub network: Network,
    /// Training runs performed so far
    pub training_runs: usize,
    /// Topology/training seed (for reproducibility)
    pub seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Create a new checkpoint; spike memories are dropped
    pub fn new(config: Config, mut network: Network, training_runs: usize, seed: u64) -> Self {
        network.clear_memories();
        Self {
            version: Self::VERSION,
            config,
            network,
            training_runs,
            seed,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CochleaError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CochleaError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{NeuronId, Sign};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_checkpoint() -> Checkpoint {
        let mut config = Config::default();
        config.topology.layer_sizes = vec![4, 3, 2];
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let network = config
            .topology()
            .build(config.decay(), config.learning.clone(), &mut rng)
            .unwrap();
        Checkpoint::new(config, network, 40, 12345)
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = create_test_checkpoint();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.bin");

        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded.training_runs, 40);
        assert_eq!(loaded.seed, checkpoint.seed);
        assert_eq!(loaded.network.len(), 9);
        for (a, b) in loaded.network.neurons().iter().zip(checkpoint.network.neurons()) {
            assert_eq!(a.inputs(), b.inputs());
            assert_eq!(a.outputs(), b.outputs());
            assert_eq!(a.location(), b.location());
        }
    }

    #[test]
    fn test_memories_not_saved() {
        let mut config = Config::default();
        config.topology.layer_sizes = vec![2];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut network = config
            .topology()
            .build(config.decay(), config.learning.clone(), &mut rng)
            .unwrap();
        network.add_sensory_input(NeuronId(0), 0, 1.0, Sign::Positive).unwrap();

        let checkpoint = Checkpoint::new(config, network, 0, 0);
        assert!(checkpoint.network.neurons()[0].memory().is_empty());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"PRMDxxxxxxxx").unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(CochleaError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = create_test_checkpoint();
        let size = checkpoint.size_bytes();
        assert!(size > 0);
        assert!(size < 1_000_000);
    }
}
