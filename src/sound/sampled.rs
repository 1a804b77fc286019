//! Sample playback

use std::sync::Arc;

use crate::engine::graph::Signal;

/// A decoded mono asset
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f32>, sample_rate: u32) -> Self {
        SampleBuffer {
            data: data.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds at the native rate
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.data.len() as f64 / self.sample_rate as f64
        }
    }
}

/// Plays a [`SampleBuffer`] at a fixed rate, looped or once
#[derive(Debug, Clone)]
pub struct SampleSignal {
    buffer: SampleBuffer,
    position: f64,
    step: f64,
    looping: bool,
}

impl SampleSignal {
    /// `rate` is the playback-rate multiplier; the buffer's own sample rate
    /// is compensated against `output_rate`.
    pub fn new(buffer: SampleBuffer, rate: f64, output_rate: f64, looping: bool) -> Self {
        let step = rate * buffer.sample_rate() as f64 / output_rate;
        SampleSignal {
            buffer,
            position: 0.0,
            step,
            looping,
        }
    }

    /// Seconds until a one-shot playback ends
    pub fn natural_duration(buffer: &SampleBuffer, rate: f64) -> f64 {
        if rate <= 0.0 {
            f64::INFINITY
        } else {
            buffer.duration_secs() / rate
        }
    }
}

impl Signal for SampleSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let data = self.buffer.samples();
        let len = data.len();
        if len == 0 {
            return None;
        }

        if self.position >= len as f64 {
            if !self.looping {
                return None;
            }
            self.position %= len as f64;
        }

        let index = self.position as usize;
        let frac = (self.position - index as f64) as f32;
        let next = if index + 1 < len {
            data[index + 1]
        } else if self.looping {
            data[0]
        } else {
            0.0
        };
        let sample = data[index] + (next - data[index]) * frac;

        self.position += self.step;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(len: usize, sample_rate: u32) -> SampleBuffer {
        SampleBuffer::new((0..len).map(|i| i as f32).collect(), sample_rate)
    }

    fn drain(signal: &mut SampleSignal, limit: usize) -> Vec<f32> {
        let mut out = Vec::new();
        while let Some(sample) = signal.next_sample(0.0) {
            out.push(sample);
            if out.len() >= limit {
                break;
            }
        }
        out
    }

    #[test]
    fn test_one_shot_ends() {
        let mut signal = SampleSignal::new(ramp_buffer(10, 1000), 1.0, 1000.0, false);
        let out = drain(&mut signal, 100);
        assert_eq!(out.len(), 10);
        assert_eq!(out[3], 3.0);
    }

    #[test]
    fn test_double_rate_halves_length() {
        let mut signal = SampleSignal::new(ramp_buffer(10, 1000), 2.0, 1000.0, false);
        assert_eq!(drain(&mut signal, 100).len(), 5);
        assert_eq!(SampleSignal::natural_duration(&ramp_buffer(10, 1000), 2.0), 0.005);
    }

    #[test]
    fn test_source_rate_is_compensated() {
        // A 500 Hz asset played into a 1000 Hz graph lasts twice as many frames.
        let mut signal = SampleSignal::new(ramp_buffer(10, 500), 1.0, 1000.0, false);
        let out = drain(&mut signal, 100);
        assert_eq!(out.len(), 20);
        assert_eq!(out[1], 0.5);
    }

    #[test]
    fn test_loop_wraps() {
        let mut signal = SampleSignal::new(ramp_buffer(4, 1000), 1.0, 1000.0, true);
        let out = drain(&mut signal, 9);
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_empty_buffer_is_exhausted() {
        let mut signal = SampleSignal::new(SampleBuffer::new(Vec::new(), 1000), 1.0, 1000.0, true);
        assert!(signal.next_sample(0.0).is_none());
    }
}
