//! Pitch mapping
//!
//! Converts the user's reference frequency into a dimensionless multiplier
//! applied to a sound's playback rate (samples) or to its cutoff/carrier
//! frequency (synthesis).

use serde::{Deserialize, Serialize};

/// Reference frequency at which every sound plays at its native rate
pub const BASE_FREQUENCY: f64 = 8000.0;

/// Lowest frequency the calibration UI offers
pub const CALIBRATION_MIN_HZ: f64 = 4500.0;

/// Highest frequency the calibration UI offers
pub const CALIBRATION_MAX_HZ: f64 = 10000.0;

/// How closely a sound tracks the reference frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// Tonal sounds follow the ratio directly
    Aggressive,
    /// Noise-like sounds follow its square root over a narrower range
    Damped,
}

impl MappingMode {
    /// Inclusive multiplier bounds
    pub fn bounds(self) -> (f64, f64) {
        match self {
            MappingMode::Aggressive => (0.5, 2.5),
            MappingMode::Damped => (0.6, 1.8),
        }
    }

    /// Multiplier for `reference_hz`
    pub fn multiplier(self, reference_hz: f64) -> f64 {
        let ratio = frequency_ratio(reference_hz);
        let (lo, hi) = self.bounds();
        match self {
            MappingMode::Aggressive => ratio.clamp(lo, hi),
            MappingMode::Damped => ratio.sqrt().clamp(lo, hi),
        }
    }
}

/// `reference_hz / BASE_FREQUENCY`; unusable input maps to 1.0
pub fn frequency_ratio(reference_hz: f64) -> f64 {
    if reference_hz.is_finite() && reference_hz > 0.0 {
        reference_hz / BASE_FREQUENCY
    } else {
        1.0
    }
}

/// Clamp a frequency into the calibration range
pub fn clamp_calibration_frequency(frequency_hz: f64) -> f64 {
    if frequency_hz.is_finite() {
        frequency_hz.clamp(CALIBRATION_MIN_HZ, CALIBRATION_MAX_HZ)
    } else {
        BASE_FREQUENCY
    }
}
