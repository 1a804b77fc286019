//! Band-limited oscillators (PolyBLEP)
//!
//! The frequency is passed to every `next_sample` call so that automated
//! parameters can drive it without the oscillator owning a timeline.

use std::f64::consts::PI;

/// Supported waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A phase-accumulating oscillator
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Start from an arbitrary phase in [0, 1)
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase.rem_euclid(1.0);
        self
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Generate the next sample at `frequency` Hz
    pub fn next_sample(&mut self, frequency: f64) -> f32 {
        let inc = (frequency / self.sample_rate).clamp(0.0, 0.5);
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Sawtooth => 2.0 * self.phase - 1.0 - poly_blep(self.phase, inc),
            Waveform::Square => {
                let naive = if self.phase < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(self.phase, inc) - poly_blep((self.phase + 0.5) % 1.0, inc)
            }
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample as f32
    }
}

/// PolyBLEP correction around a waveform discontinuity
///
/// `t` is the phase in [0, 1), `dt` the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(waveform: Waveform, frequency: f64) -> f32 {
        let mut osc = Oscillator::new(waveform, 48000.0);
        (0..48000)
            .map(|_| osc.next_sample(frequency).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let mut osc = Oscillator::new(Waveform::Sine, 48000.0);
        assert!(osc.next_sample(440.0).abs() < 1e-6);
    }

    #[test]
    fn test_ranges() {
        assert!(peak(Waveform::Sine, 440.0) <= 1.0);
        assert!(peak(Waveform::Triangle, 440.0) <= 1.0);
        assert!(peak(Waveform::Sawtooth, 440.0) <= 1.5);
        assert!(peak(Waveform::Square, 440.0) <= 1.5);
    }

    #[test]
    fn test_sine_zero_crossings_track_frequency() {
        let mut osc = Oscillator::new(Waveform::Sine, 48000.0);
        let mut crossings = 0;
        let mut last = osc.next_sample(100.0);
        for _ in 1..48000 {
            let sample = osc.next_sample(100.0);
            if last < 0.0 && sample >= 0.0 {
                crossings += 1;
            }
            last = sample;
        }
        assert!((99..=101).contains(&crossings), "got {crossings}");
    }

    #[test]
    fn test_with_phase_wraps() {
        let mut osc = Oscillator::new(Waveform::Sine, 48000.0).with_phase(1.25);
        assert!((osc.next_sample(0.0) - 1.0).abs() < 1e-6);
    }
}
