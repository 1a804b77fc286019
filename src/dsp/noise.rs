//! Noise sources

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniform white noise in [-1, 1)
#[derive(Debug, Clone)]
pub struct WhiteNoise {
    rng: Pcg32,
}

impl WhiteNoise {
    pub fn new(seed: u64) -> Self {
        WhiteNoise {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        self.rng.random_range(-1.0f32..1.0)
    }
}

/// Brownian (red) noise: integrated white noise with a leak
///
/// Used for slow, rumbling textures where white noise through a lowpass
/// still sounds too hissy.
#[derive(Debug, Clone)]
pub struct BrownNoise {
    white: WhiteNoise,
    last: f32,
}

impl BrownNoise {
    pub fn new(seed: u64) -> Self {
        BrownNoise {
            white: WhiteNoise::new(seed),
            last: 0.0,
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let white = self.white.next_sample();
        self.last = (self.last + 0.02 * white) / 1.02;
        (self.last * 3.5).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_noise_is_bounded_and_centered() {
        let mut noise = WhiteNoise::new(1);
        let samples: Vec<f32> = (0..48000).map(|_| noise.next_sample()).collect();
        assert!(samples.iter().all(|s| (-1.0..1.0).contains(s)));
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert!(mean.abs() < 0.02);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = WhiteNoise::new(9);
        let mut b = WhiteNoise::new(9);
        for _ in 0..100 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn test_brown_noise_is_bounded() {
        let mut noise = BrownNoise::new(3);
        for _ in 0..96000 {
            assert!(noise.next_sample().abs() <= 1.0);
        }
    }
}
