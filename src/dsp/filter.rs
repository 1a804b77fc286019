//! Biquad filters
//!
//! Coefficients from the Audio EQ Cookbook, Direct Form II Transposed state.
//! Cutoff changes recompute coefficients immediately; callers that modulate
//! the cutoff every sample should throttle updates.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Remove above the cutoff
    LowPass,
    /// Remove below the cutoff
    HighPass,
}

/// Normalized biquad coefficients
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn calculate(filter_type: FilterType, sample_rate: f64, frequency: f64, q: f64) -> Self {
        // Keep the cutoff strictly below Nyquist
        let freq = frequency.min(sample_rate / 2.0 - 1.0).max(10.0);
        let q = q.clamp(0.1, 30.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// A second-order IIR filter
#[derive(Debug, Clone)]
pub struct Biquad {
    filter_type: FilterType,
    sample_rate: f64,
    cutoff: f64,
    q: f64,
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn new(filter_type: FilterType, sample_rate: f64, cutoff: f64, q: f64) -> Self {
        Biquad {
            filter_type,
            sample_rate,
            cutoff,
            q,
            coeffs: BiquadCoeffs::calculate(filter_type, sample_rate, cutoff, q),
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        if (cutoff - self.cutoff).abs() > f64::EPSILON {
            self.cutoff = cutoff;
            self.coeffs = BiquadCoeffs::calculate(self.filter_type, self.sample_rate, cutoff, self.q);
        }
    }

    /// Process one sample
    pub fn process(&mut self, input: f32) -> f32 {
        let x = input as f64;
        let c = self.coeffs;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y as f32
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_amplitude(filter: &mut Biquad, frequency: f64) -> f32 {
        let mut peak = 0.0f32;
        for i in 0..9600 {
            let t = i as f64 / 48000.0;
            let out = filter.process((2.0 * PI * frequency * t).sin() as f32);
            if i > 4800 {
                peak = peak.max(out.abs());
            }
        }
        peak
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = Biquad::new(FilterType::LowPass, 48000.0, 1000.0, 0.707);
        let mut out = 0.0;
        for _ in 0..2000 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new(FilterType::HighPass, 48000.0, 1000.0, 0.707);
        let mut out = 1.0;
        for _ in 0..2000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-3);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut filter = Biquad::new(FilterType::LowPass, 48000.0, 300.0, 0.707);
        assert!(steady_amplitude(&mut filter, 8000.0) < 0.01);
    }

    #[test]
    fn test_cutoff_above_nyquist_is_stable() {
        let mut filter = Biquad::new(FilterType::LowPass, 48000.0, 90000.0, 1.0);
        for i in 0..4800 {
            let out = filter.process(if i % 7 == 0 { 1.0 } else { -0.5 });
            assert!(out.is_finite());
        }
    }

    #[test]
    fn test_tiny_sample_rate_does_not_panic() {
        let mut filter = Biquad::new(FilterType::LowPass, 16.0, 8000.0, 0.707);
        filter.process(1.0);
        filter.set_cutoff(3.0);
        filter.process(-1.0);
    }

    #[test]
    fn test_set_cutoff_updates_response() {
        let mut filter = Biquad::new(FilterType::LowPass, 48000.0, 200.0, 0.707);
        let low = steady_amplitude(&mut filter, 2000.0);
        filter.reset();
        filter.set_cutoff(8000.0);
        let high = steady_amplitude(&mut filter, 2000.0);
        assert!(high > low * 5.0);
        assert_eq!(filter.cutoff(), 8000.0);
    }
}
