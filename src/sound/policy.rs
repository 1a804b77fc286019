//! Per-category policy table
//!
//! Everything that differs between sounds is data in [`POLICIES`]; the engine
//! runs one generic start/stop routine over it. Adding a sound means adding a
//! row here and a [`SoundId`] variant.

use super::ducking::DuckingLevels;
use super::pitch::MappingMode;
use super::SoundId;
use crate::dsp::FilterType;

/// Spectral color of a noise recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    White,
    Brown,
}

/// How to synthesize a sound when its asset is missing
///
/// All frequencies are native values at the base reference frequency; the
/// pitch multiplier scales them at start time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthRecipe {
    /// Filtered noise with a slow amplitude swell
    FilteredNoise {
        color: NoiseColor,
        filter: FilterType,
        cutoff_hz: f64,
        q: f64,
        swell_hz: f64,
        swell_depth: f32,
    },
    /// A phrase of short frequency-modulated chirps
    Chirp {
        carrier_hz: f64,
        sweep: f64,
        vibrato_hz: f64,
        vibrato_depth_hz: f64,
        chirps: usize,
        chirp_secs: f64,
        gap_secs: f64,
    },
    /// A carrier gated by a fast square wave
    PulsedTone { carrier_hz: f64, pulse_hz: f64 },
}

impl SynthRecipe {
    /// Native duration of one-shot recipes
    pub fn native_duration(&self) -> Option<f64> {
        match *self {
            SynthRecipe::Chirp {
                chirps,
                chirp_secs,
                gap_secs,
                ..
            } => Some(chirps as f64 * (chirp_secs + gap_secs)),
            _ => None,
        }
    }
}

/// Everything the engine needs to know about one sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundPolicy {
    pub id: SoundId,
    /// File name looked up in the asset source
    pub asset_file: &'static str,
    pub mapping: MappingMode,
    /// Looped beds versus one-shot content
    pub looping: bool,
    /// Target gain of the sampled variant
    pub gain: f32,
    /// Target gain of the synthesized variant
    pub synth_gain: f32,
    pub fade_in_secs: f64,
    /// Fade applied when the caller releases the channel
    pub fade_out_secs: f64,
    pub recipe: SynthRecipe,
    /// Present on the ambient bed that gives way to other sounds
    pub ducking: Option<DuckingLevels>,
}

impl SoundPolicy {
    /// Full-level gain for the given source kind
    pub fn base_gain(&self, synthesized: bool) -> f32 {
        if synthesized {
            self.synth_gain
        } else {
            self.gain
        }
    }
}

pub static POLICIES: [SoundPolicy; 6] = [
    SoundPolicy {
        id: SoundId::Bird,
        asset_file: "bird.wav",
        mapping: MappingMode::Aggressive,
        looping: false,
        gain: 0.5,
        synth_gain: 0.22,
        fade_in_secs: 0.1,
        fade_out_secs: 0.3,
        recipe: SynthRecipe::Chirp {
            carrier_hz: 3200.0,
            sweep: 0.45,
            vibrato_hz: 38.0,
            vibrato_depth_hz: 220.0,
            chirps: 5,
            chirp_secs: 0.11,
            gap_secs: 0.17,
        },
        ducking: None,
    },
    SoundPolicy {
        id: SoundId::Wind,
        asset_file: "wind.wav",
        mapping: MappingMode::Damped,
        looping: true,
        gain: 0.4,
        synth_gain: 0.3,
        fade_in_secs: 1.0,
        fade_out_secs: 1.5,
        recipe: SynthRecipe::FilteredNoise {
            color: NoiseColor::Brown,
            filter: FilterType::LowPass,
            cutoff_hz: 800.0,
            q: 1.2,
            swell_hz: 0.12,
            swell_depth: 0.5,
        },
        ducking: None,
    },
    SoundPolicy {
        id: SoundId::Leaves,
        asset_file: "leaves.wav",
        mapping: MappingMode::Damped,
        looping: true,
        gain: 0.35,
        synth_gain: 0.12,
        fade_in_secs: 0.5,
        fade_out_secs: 0.8,
        recipe: SynthRecipe::FilteredNoise {
            color: NoiseColor::White,
            filter: FilterType::HighPass,
            cutoff_hz: 3500.0,
            q: 0.7,
            swell_hz: 0.3,
            swell_depth: 0.6,
        },
        ducking: None,
    },
    SoundPolicy {
        id: SoundId::Water,
        asset_file: "water.wav",
        mapping: MappingMode::Damped,
        looping: true,
        gain: 0.4,
        synth_gain: 0.28,
        fade_in_secs: 0.8,
        fade_out_secs: 1.0,
        recipe: SynthRecipe::FilteredNoise {
            color: NoiseColor::White,
            filter: FilterType::LowPass,
            cutoff_hz: 1200.0,
            q: 0.7,
            swell_hz: 0.6,
            swell_depth: 0.3,
        },
        ducking: None,
    },
    SoundPolicy {
        id: SoundId::Rain,
        asset_file: "rain.wav",
        mapping: MappingMode::Damped,
        looping: true,
        gain: 0.15,
        synth_gain: 0.08,
        fade_in_secs: 1.0,
        fade_out_secs: 1.5,
        recipe: SynthRecipe::FilteredNoise {
            color: NoiseColor::White,
            filter: FilterType::HighPass,
            cutoff_hz: 1500.0,
            q: 0.5,
            swell_hz: 0.05,
            swell_depth: 0.1,
        },
        ducking: Some(DuckingLevels {
            sampled: (0.15, 0.05),
            synthesized: (0.08, 0.03),
        }),
    },
    SoundPolicy {
        id: SoundId::Insect,
        asset_file: "insect.wav",
        mapping: MappingMode::Aggressive,
        looping: true,
        gain: 0.2,
        synth_gain: 0.05,
        fade_in_secs: 0.3,
        fade_out_secs: 0.5,
        recipe: SynthRecipe::PulsedTone {
            carrier_hz: 4200.0,
            pulse_hz: 32.0,
        },
        ducking: None,
    },
];

/// Look up the policy row for `id`
pub fn policy(id: SoundId) -> &'static SoundPolicy {
    &POLICIES[id.index()]
}
