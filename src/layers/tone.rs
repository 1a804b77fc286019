//! Calibration tone
//!
//! A pure sine the user tunes to match their tinnitus. Only one tone exists at
//! a time; starting a new one stops the previous one first.

use log::{debug, info};

use crate::dsp::{envelope, AudioParam, Oscillator, Waveform};
use crate::engine::graph::{AudioGraph, NodeId, Signal};
use crate::sound::pitch::clamp_calibration_frequency;

pub const TONE_FADE_IN_SECS: f64 = 0.1;
pub const TONE_FADE_OUT_SECS: f64 = 0.5;

/// Time constant of frequency glides while the slider moves
pub const TONE_GLIDE_TIME_CONSTANT: f64 = 0.015;

/// Extra time after the fade-out before the voice is torn down
const TEARDOWN_MARGIN_SECS: f64 = 0.1;

/// The single calibration tone slot
#[derive(Debug, Default)]
pub struct CalibrationTone {
    node: Option<NodeId>,
}

impl CalibrationTone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.node.is_some()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Start a tone at `frequency` (clamped into the calibration range)
    pub fn start(&mut self, graph: &mut AudioGraph, frequency: f64, gain: f32) -> NodeId {
        self.stop(graph);

        let frequency = clamp_calibration_frequency(frequency);
        let now = graph.current_time();
        let mut level = AudioParam::new(0.0);
        envelope::ramp_to(&mut level, now, gain, TONE_FADE_IN_SECS);

        let signal = ToneSignal::new(graph.sample_rate(), frequency);
        let node = graph.add_voice(Box::new(signal), level, now);
        self.node = Some(node);
        info!("[TONE] Started at {:.1} Hz", frequency);
        node
    }

    /// Glide the playing tone to `frequency`; no-op when nothing is playing
    pub fn update(&mut self, graph: &mut AudioGraph, frequency: f64) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        let frequency = clamp_calibration_frequency(frequency);
        let now = graph.current_time();
        match graph.signal_mut(node).and_then(|signal| signal.frequency_mut()) {
            Some(param) => {
                envelope::glide_to(param, now, frequency as f32, TONE_GLIDE_TIME_CONSTANT);
                debug!("[TONE] Gliding to {:.1} Hz", frequency);
                true
            }
            None => {
                self.node = None;
                false
            }
        }
    }

    /// Fade the tone out and tear it down; safe to call repeatedly
    pub fn stop(&mut self, graph: &mut AudioGraph) -> bool {
        let Some(node) = self.node.take() else {
            return false;
        };
        let now = graph.current_time();
        if let Some(gain) = graph.gain_mut(node) {
            envelope::fade_out_exponential(gain, now, TONE_FADE_OUT_SECS);
        }
        graph.stop_at(node, now + TONE_FADE_OUT_SECS + TEARDOWN_MARGIN_SECS);
        info!("[TONE] Stopped at {:.3}s", now);
        true
    }

    /// Forget the voice if the graph ended it
    pub fn on_node_ended(&mut self, ended: NodeId) {
        if self.node == Some(ended) {
            self.node = None;
        }
    }
}

struct ToneSignal {
    oscillator: Oscillator,
    frequency: AudioParam,
}

impl ToneSignal {
    fn new(sample_rate: f64, frequency: f64) -> Self {
        ToneSignal {
            oscillator: Oscillator::new(Waveform::Sine, sample_rate),
            frequency: AudioParam::new(frequency as f32),
        }
    }
}

impl Signal for ToneSignal {
    fn next_sample(&mut self, time: f64) -> Option<f32> {
        let frequency = self.frequency.value_at(time) as f64;
        self.frequency.prune(time);
        Some(self.oscillator.next_sample(frequency))
    }

    fn frequency_mut(&mut self) -> Option<&mut AudioParam> {
        Some(&mut self.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::pitch::{CALIBRATION_MAX_HZ, CALIBRATION_MIN_HZ};

    fn frequency_of(graph: &mut AudioGraph, node: NodeId, time: f64) -> f32 {
        graph
            .signal_mut(node)
            .and_then(|signal| signal.frequency_mut())
            .map(|param| param.value_at(time))
            .unwrap()
    }

    #[test]
    fn test_start_clamps_frequency() {
        let mut graph = AudioGraph::new(48000, 1.0);
        let mut tone = CalibrationTone::new();
        let node = tone.start(&mut graph, 20000.0, 0.1);
        assert_eq!(frequency_of(&mut graph, node, 0.0), CALIBRATION_MAX_HZ as f32);

        let node = tone.start(&mut graph, 100.0, 0.1);
        assert_eq!(frequency_of(&mut graph, node, 0.0), CALIBRATION_MIN_HZ as f32);
    }

    #[test]
    fn test_restart_replaces_previous_tone() {
        let mut graph = AudioGraph::new(48000, 1.0);
        let mut tone = CalibrationTone::new();
        let first = tone.start(&mut graph, 6000.0, 0.1);
        let second = tone.start(&mut graph, 7000.0, 0.1);

        assert_ne!(first, second);
        assert_eq!(tone.node(), Some(second));
        assert!(graph.scheduled_stop(first).is_some());
        assert!(graph.scheduled_stop(second).is_none());
    }

    #[test]
    fn test_update_glides() {
        let mut graph = AudioGraph::new(48000, 1.0);
        let mut tone = CalibrationTone::new();
        let node = tone.start(&mut graph, 6000.0, 0.1);
        assert!(tone.update(&mut graph, 7000.0));

        let early = frequency_of(&mut graph, node, 0.001);
        assert!(early > 6000.0 && early < 7000.0);
        let settled = frequency_of(&mut graph, node, 0.5);
        assert!((settled - 7000.0).abs() < 0.5);
    }

    #[test]
    fn test_update_without_tone_is_noop() {
        let mut graph = AudioGraph::new(48000, 1.0);
        let mut tone = CalibrationTone::new();
        assert!(!tone.update(&mut graph, 7000.0));
        assert_eq!(graph.voice_count(), 0);
    }

    #[test]
    fn test_double_stop_is_safe() {
        let mut graph = AudioGraph::new(48000, 1.0);
        let mut tone = CalibrationTone::new();
        let node = tone.start(&mut graph, 6000.0, 0.1);

        assert!(tone.stop(&mut graph));
        let stop = graph.scheduled_stop(node);
        assert!(!tone.stop(&mut graph));
        assert_eq!(graph.scheduled_stop(node), stop);

        let mut block = vec![0.0; 48000];
        graph.render(&mut block);
        assert_eq!(graph.voice_count(), 0);
    }
}
