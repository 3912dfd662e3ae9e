//! cochlea - CLI Entry Point
//!
//! Train a spiking network on tones and play test audio through it.

use clap::{Parser, Subcommand};
use cochlea::chain::{first_spike, ChainDemo};
use cochlea::checkpoint::Checkpoint;
use cochlea::snapshot::{FrameObserver, SnapshotRecorder};
use cochlea::training::{test_example, tone_examples, Trainer};
use cochlea::{benchmark, Config};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cochlea")]
#[command(version)]
#[command(about = "Spiking neural network with Hebbian learning on audio spectrograms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Build a network and train it on the configured tones
    Train {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Output directory for the checkpoint and history
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Play the tone-sequence test clip through a trained network
    Run {
        /// Checkpoint file
        #[arg(short = 'k', long)]
        checkpoint: PathBuf,

        /// Write per-frame snapshots to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Three-neuron chain demonstration
    Chain {
        /// Pulse amplitude fed to the first neuron
        #[arg(short, long, default_value = "0.3")]
        amplitude: f64,

        /// Number of frames
        #[arg(short, long, default_value = "100")]
        frames: usize,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of frames
        #[arg(short, long, default_value = "100")]
        frames: usize,

        /// Topology seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }

        Commands::Train {
            config,
            output,
            seed,
        } => {
            let config = load_config(&config)?;
            init_logging(&config.logging.log_level);
            train_network(config, output, seed)
        }

        Commands::Run { checkpoint, output } => {
            init_logging("info");
            run_test_clip(checkpoint, output)
        }

        Commands::Chain { amplitude, frames } => {
            init_logging("info");
            run_chain(amplitude, frames)
        }

        Commands::Benchmark { frames, seed } => {
            init_logging("info");
            run_benchmark(frames, seed)
        }
    }
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn train_network(config: Config, output: PathBuf, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&output)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut network = config
        .topology()
        .build(config.decay(), config.learning.clone(), &mut rng)?;

    println!("Building network");
    println!("  Layers: {:?}", config.topology.layer_sizes);
    println!("  Neurons: {}", network.len());
    println!("  Seed: {}", seed);

    println!("Generating training examples");
    let examples = tone_examples(&network, &config)?;
    for (i, frequency) in config.audio.tones.iter().enumerate() {
        println!("  {:2}: {:8.2} Hz", i, frequency);
    }

    println!("Training");
    let start = Instant::now();
    let history = Trainer::from_config(&config).train(&mut network, &examples, &mut rng)?;
    let elapsed = start.elapsed();

    println!();
    println!("=== Training Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("{}", history.summary());
    println!("Flip rate: {:.4}", network.learning_stats().flip_rate());

    let checkpoint_path = output.join("network.bin");
    Checkpoint::new(config, network, history.len(), seed).save(&checkpoint_path)?;
    println!("Checkpoint: {:?}", checkpoint_path);

    let history_path = output.join("training_history.json");
    history.save_json(&history_path)?;
    println!("Training history: {:?}", history_path);

    Ok(())
}

fn run_test_clip(checkpoint_path: PathBuf, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);
    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let config = checkpoint.config;
    let mut network = checkpoint.network;
    println!("Trained for {} runs (seed {})", checkpoint.training_runs, checkpoint.seed);

    let example = test_example(&network, &config)?;
    let mut recorder = SnapshotRecorder::new();
    let observer: Option<&mut dyn FrameObserver> = if output.is_some() {
        Some(&mut recorder)
    } else {
        None
    };

    let start = Instant::now();
    let stats = example.run(&mut network, 0, observer)?;
    println!("{}", stats.summary());
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    let outputs = network.layer_ids(network.layer_count().saturating_sub(1));
    println!();
    println!("Output spikes:");
    for (i, id) in outputs.iter().enumerate() {
        let tone = config
            .audio
            .tones
            .get(i)
            .map(|f| format!("{:8.2} Hz", f))
            .unwrap_or_else(|| "       -".to_string());
        println!("  {} neuron {:4}: {:5} spikes", tone, id, stats.spikes_of(*id));
    }

    if let Some(path) = output {
        recorder.save_json(&path)?;
        println!("Snapshots: {:?}", path);
    }

    Ok(())
}

fn run_chain(amplitude: f64, frames: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut demo = ChainDemo::new()?;
    let trace = demo.run(amplitude, frames)?;

    println!("frame\ta\tb\tc");
    for row in &trace {
        let marks: Vec<String> = row
            .potentials
            .iter()
            .zip(row.spiked)
            .map(|(p, s)| format!("{:.4}{}", p, if s { "*" } else { "" }))
            .collect();
        println!("{}\t{}", row.frame, marks.join("\t"));
    }

    println!();
    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        match first_spike(&trace, i) {
            Some(frame) => println!("{} first spiked at frame {}", name, frame),
            None => println!("{} never spiked", name),
        }
    }

    Ok(())
}

fn run_benchmark(frames: usize, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== cochlea Benchmark ===");
    println!("Frames: {}", frames);
    println!();

    let result = benchmark(frames, seed)?;
    println!("{}", result);

    Ok(())
}

