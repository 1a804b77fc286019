//! CLI Module
//!
//! Command-line interface for offline rendering with the ambient engine.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::sound::pitch::BASE_FREQUENCY;
use crate::sound::SoundId;

/// Ambience - interactive ambient audio engine, rendered offline
#[derive(Parser, Debug)]
#[command(name = "ambience-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a session to a WAV file
    #[command(name = "render")]
    Render(RenderArgs),

    /// Render a calibration tone sweep to a WAV file
    #[command(name = "tone")]
    Tone(ToneArgs),

    /// Print the pitch multiplier of every sound for a reference frequency
    #[command(name = "map")]
    Map {
        /// Reference frequency in Hz
        frequency: f64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Output WAV file
    pub output: PathBuf,

    /// Reference (tinnitus) frequency in Hz
    #[arg(short, long, default_value_t = BASE_FREQUENCY)]
    pub frequency: f64,

    /// Sounds to start, comma separated (bird,wind,leaves,water,rain,insect)
    #[arg(short, long, value_delimiter = ',')]
    pub sounds: Vec<SoundId>,

    /// Enable the drone layer
    #[arg(long)]
    pub drone: bool,

    /// Enable the generative sequencer
    #[arg(long)]
    pub piano: bool,

    /// Directory containing the sound assets
    #[arg(short, long)]
    pub assets: Option<PathBuf>,

    /// Length of the render in seconds
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// RNG seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output bit depth: 16, 24 or 32 (float)
    #[arg(long, default_value_t = 16)]
    pub bit_depth: u16,
}

#[derive(Args, Debug, Clone)]
pub struct ToneArgs {
    /// Output WAV file
    pub output: PathBuf,

    /// Sweep start frequency in Hz
    #[arg(long, default_value_t = 4500.0)]
    pub from: f64,

    /// Sweep end frequency in Hz
    #[arg(long, default_value_t = 10000.0)]
    pub to: f64,

    /// Sweep length in seconds
    #[arg(short, long, default_value_t = 5.0)]
    pub duration: f64,

    /// Tone gain (0.0 to 1.0)
    #[arg(short, long, default_value_t = 0.2)]
    pub gain: f32,
}
