//! Synthesis fallback
//!
//! Procedural stand-ins for missing assets, built from a [`SynthRecipe`] and
//! the same pitch multiplier a sample would get. Noise beds loop forever;
//! the chirp phrase is one-shot and stretches with the multiplier the way a
//! resampled recording would.

use std::f64::consts::PI;

use super::policy::{NoiseColor, SynthRecipe};
use crate::dsp::{Biquad, BrownNoise, Oscillator, Waveform, WhiteNoise};
use crate::engine::graph::Signal;

/// Build the fallback signal for `recipe`
pub fn build(recipe: &SynthRecipe, multiplier: f64, sample_rate: f64, seed: u64) -> Box<dyn Signal> {
    match *recipe {
        SynthRecipe::FilteredNoise {
            color,
            filter,
            cutoff_hz,
            q,
            swell_hz,
            swell_depth,
        } => {
            let source = match color {
                NoiseColor::White => NoiseSource::White(WhiteNoise::new(seed)),
                NoiseColor::Brown => NoiseSource::Brown(BrownNoise::new(seed)),
            };
            Box::new(NoiseSignal {
                source,
                filter: Biquad::new(filter, sample_rate, cutoff_hz * multiplier, q),
                swell: Oscillator::new(Waveform::Sine, sample_rate).with_phase(0.75),
                swell_hz,
                swell_depth,
            })
        }
        SynthRecipe::Chirp {
            carrier_hz,
            sweep,
            vibrato_hz,
            vibrato_depth_hz,
            chirps,
            chirp_secs,
            gap_secs,
        } => Box::new(ChirpSignal {
            carrier: Oscillator::new(Waveform::Sine, sample_rate),
            vibrato: Oscillator::new(Waveform::Sine, sample_rate),
            carrier_hz: carrier_hz * multiplier,
            sweep,
            vibrato_hz: vibrato_hz * multiplier,
            vibrato_depth_hz: vibrato_depth_hz * multiplier,
            chirps,
            chirp_secs: chirp_secs / multiplier,
            period_secs: (chirp_secs + gap_secs) / multiplier,
            elapsed_frames: 0,
            sample_rate,
        }),
        SynthRecipe::PulsedTone {
            carrier_hz,
            pulse_hz,
        } => Box::new(PulsedToneSignal {
            carrier: Oscillator::new(Waveform::Sine, sample_rate),
            pulse: Oscillator::new(Waveform::Square, sample_rate),
            carrier_hz: carrier_hz * multiplier,
            pulse_hz: pulse_hz * multiplier,
            gate: 0.0,
            smoothing: (-1.0 / (0.002 * sample_rate)).exp() as f32,
        }),
    }
}

/// Duration of a one-shot recipe at `multiplier`
pub fn duration(recipe: &SynthRecipe, multiplier: f64) -> Option<f64> {
    recipe
        .native_duration()
        .map(|secs| secs / multiplier.max(f64::MIN_POSITIVE))
}

// ============================================================================
// Filtered noise
// ============================================================================

#[derive(Debug, Clone)]
enum NoiseSource {
    White(WhiteNoise),
    Brown(BrownNoise),
}

impl NoiseSource {
    fn next_sample(&mut self) -> f32 {
        match self {
            NoiseSource::White(noise) => noise.next_sample(),
            NoiseSource::Brown(noise) => noise.next_sample(),
        }
    }
}

struct NoiseSignal {
    source: NoiseSource,
    filter: Biquad,
    swell: Oscillator,
    swell_hz: f64,
    swell_depth: f32,
}

impl Signal for NoiseSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let filtered = self.filter.process(self.source.next_sample());
        // Starts at the swell minimum so the fade-in is not doubled up.
        let swell = 0.5 + 0.5 * self.swell.next_sample(self.swell_hz);
        Some(filtered * (1.0 - self.swell_depth * (1.0 - swell)))
    }
}

// ============================================================================
// Bird chirps
// ============================================================================

struct ChirpSignal {
    carrier: Oscillator,
    vibrato: Oscillator,
    carrier_hz: f64,
    sweep: f64,
    vibrato_hz: f64,
    vibrato_depth_hz: f64,
    chirps: usize,
    chirp_secs: f64,
    period_secs: f64,
    elapsed_frames: u64,
    sample_rate: f64,
}

impl Signal for ChirpSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let elapsed = self.elapsed_frames as f64 / self.sample_rate;
        self.elapsed_frames += 1;

        if self.period_secs <= 0.0 || elapsed >= self.period_secs * self.chirps as f64 {
            return None;
        }

        let within = elapsed % self.period_secs;
        let vibrato = self.vibrato.next_sample(self.vibrato_hz) as f64;
        if within >= self.chirp_secs {
            return Some(0.0);
        }

        let progress = within / self.chirp_secs;
        let frequency =
            self.carrier_hz * (1.0 + self.sweep * progress) + self.vibrato_depth_hz * vibrato;
        let window = (PI * progress).sin().powi(2) as f32;
        Some(self.carrier.next_sample(frequency) * window)
    }
}

// ============================================================================
// Insect buzz
// ============================================================================

struct PulsedToneSignal {
    carrier: Oscillator,
    pulse: Oscillator,
    carrier_hz: f64,
    pulse_hz: f64,
    gate: f32,
    smoothing: f32,
}

impl Signal for PulsedToneSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let open = if self.pulse.next_sample(self.pulse_hz) > 0.0 { 1.0 } else { 0.0 };
        self.gate = open + (self.gate - open) * self.smoothing;
        Some(self.carrier.next_sample(self.carrier_hz) * self.gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{policy, SoundId};

    const RATE: f64 = 48000.0;

    fn render(signal: &mut dyn Signal, frames: usize) -> Vec<f32> {
        (0..frames).map_while(|_| signal.next_sample(0.0)).collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|pair| (pair[0] < 0.0) != (pair[1] < 0.0))
            .count()
    }

    #[test]
    fn test_every_recipe_is_audible() {
        for id in SoundId::ALL {
            let mut signal = build(&policy(id).recipe, 1.0, RATE, 11);
            let samples = render(signal.as_mut(), 48000);
            assert!(rms(&samples) > 0.01, "{id} is silent");
            assert!(samples.iter().all(|s| s.is_finite() && s.abs() < 4.0));
        }
    }

    #[test]
    fn test_noise_cutoff_follows_multiplier() {
        let recipe = &policy(SoundId::Water).recipe;
        let low = render(build(recipe, 0.6, RATE, 5).as_mut(), 48000);
        let high = render(build(recipe, 1.8, RATE, 5).as_mut(), 48000);
        assert!(zero_crossings(&high) > zero_crossings(&low));
    }

    #[test]
    fn test_chirp_is_one_shot_and_scales_with_multiplier() {
        let recipe = &policy(SoundId::Bird).recipe;
        let native = duration(recipe, 1.0).unwrap();
        let frames = render(build(recipe, 1.0, RATE, 0).as_mut(), 10 * 48000).len();
        assert!((frames as f64 / RATE - native).abs() < 0.001);

        let fast = render(build(recipe, 2.0, RATE, 0).as_mut(), 10 * 48000).len();
        assert!((fast as f64 / RATE - native / 2.0).abs() < 0.001);
    }

    #[test]
    fn test_noise_beds_loop_forever() {
        let mut signal = build(&policy(SoundId::Rain).recipe, 1.0, RATE, 2);
        assert_eq!(render(signal.as_mut(), 5 * 48000).len(), 5 * 48000);
        assert!(duration(&policy(SoundId::Rain).recipe, 1.0).is_none());
    }

    #[test]
    fn test_insect_carrier_tracks_multiplier() {
        let recipe = &policy(SoundId::Insect).recipe;
        let low = render(build(recipe, 0.5, RATE, 0).as_mut(), 48000);
        let high = render(build(recipe, 1.25, RATE, 0).as_mut(), 48000);
        assert!(zero_crossings(&high) > zero_crossings(&low) * 2);
    }
}
