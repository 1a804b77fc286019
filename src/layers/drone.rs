//! Drone layer
//!
//! A sustained pad: two detuned sawtooth layers through their own lowpass
//! filters, a sub-octave sine, and one slow LFO that sweeps both cutoffs.
//! The whole stack is a single graph voice, so enabling and disabling is a
//! matter of one gain fade and one stop time.

use std::fmt;

use log::{debug, info};

use crate::dsp::{envelope, AudioParam, Biquad, FilterType, Oscillator, Waveform};
use crate::engine::graph::{AudioGraph, NodeId, Signal};

/// Root frequency of the pad in Hz
pub const DRONE_ROOT_HZ: f64 = 110.0;

/// Target gain once faded in
pub const DRONE_GAIN: f32 = 0.06;

pub const DRONE_FADE_IN_SECS: f64 = 4.0;
pub const DRONE_FADE_OUT_SECS: f64 = 1.5;

const DETUNE_CENTS: f64 = 7.0;
const CUTOFFS_HZ: [f64; 2] = [420.0, 640.0];
const LFO_HZ: f64 = 0.07;
const LFO_DEPTH_HZ: f64 = 220.0;
const SUB_LEVEL: f32 = 0.8;
// Filter coefficients are refreshed every this many samples.
const MODULATION_INTERVAL: u32 = 32;

/// Public view of the drone lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DroneState {
    #[default]
    Off,
    FadingIn,
    On,
    FadingOut,
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneState::Off => write!(f, "Off"),
            DroneState::FadingIn => write!(f, "FadingIn"),
            DroneState::On => write!(f, "On"),
            DroneState::FadingOut => write!(f, "FadingOut"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lifecycle {
    Off,
    Active { node: NodeId, settled_at: f64 },
    FadingOut { node: NodeId },
}

/// Owns the drone's graph voice and its state machine
#[derive(Debug)]
pub struct DroneLayer {
    lifecycle: Lifecycle,
}

impl Default for DroneLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DroneLayer {
    pub fn new() -> Self {
        DroneLayer {
            lifecycle: Lifecycle::Off,
        }
    }

    /// Current state at time `now`
    pub fn state(&self, now: f64) -> DroneState {
        match self.lifecycle {
            Lifecycle::Off => DroneState::Off,
            Lifecycle::Active { settled_at, .. } if now < settled_at => DroneState::FadingIn,
            Lifecycle::Active { .. } => DroneState::On,
            Lifecycle::FadingOut { .. } => DroneState::FadingOut,
        }
    }

    /// The voice of the current (not fading-out) drone stack
    pub fn node(&self) -> Option<NodeId> {
        match self.lifecycle {
            Lifecycle::Active { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Build the stack and fade it in
    ///
    /// No-op while fading in or on. From `FadingOut` a fresh stack is built
    /// and the old one finishes its teardown independently. Returns true if a
    /// stack was built.
    pub fn enable(&mut self, graph: &mut AudioGraph) -> bool {
        if matches!(self.lifecycle, Lifecycle::Active { .. }) {
            debug!("[DRONE] Already enabled");
            return false;
        }

        let now = graph.current_time();
        let mut gain = AudioParam::new(0.0);
        envelope::ramp_to(&mut gain, now, DRONE_GAIN, DRONE_FADE_IN_SECS);
        let node = graph.add_voice(Box::new(DroneSignal::new(graph.sample_rate())), gain, now);

        self.lifecycle = Lifecycle::Active {
            node,
            settled_at: now + DRONE_FADE_IN_SECS,
        };
        info!("[DRONE] Enabled at {:.3}s", now);
        true
    }

    /// Fade out and schedule the teardown
    ///
    /// No-op unless the drone is fading in or on, so repeated calls never
    /// schedule a second teardown. Returns true if a fade-out was scheduled.
    pub fn disable(&mut self, graph: &mut AudioGraph) -> bool {
        let Lifecycle::Active { node, .. } = self.lifecycle else {
            debug!("[DRONE] Already disabled or fading out");
            return false;
        };

        let now = graph.current_time();
        if let Some(gain) = graph.gain_mut(node) {
            envelope::fade_out(gain, now, DRONE_FADE_OUT_SECS);
        }
        if graph.stop_at(node, now + DRONE_FADE_OUT_SECS) {
            self.lifecycle = Lifecycle::FadingOut { node };
        } else {
            self.lifecycle = Lifecycle::Off;
        }
        info!("[DRONE] Disabled at {:.3}s", now);
        true
    }

    /// Notify the layer that a graph voice ended
    pub fn on_node_ended(&mut self, ended: NodeId) {
        match self.lifecycle {
            Lifecycle::FadingOut { node } | Lifecycle::Active { node, .. } if node == ended => {
                debug!("[DRONE] Stack released");
                self.lifecycle = Lifecycle::Off;
            }
            _ => {}
        }
    }
}

/// The pad itself
struct DroneSignal {
    saws: [Oscillator; 2],
    filters: [Biquad; 2],
    sub: Oscillator,
    lfo: Oscillator,
    lfo_value: f64,
    countdown: u32,
}

impl DroneSignal {
    fn new(sample_rate: f64) -> Self {
        DroneSignal {
            saws: [
                Oscillator::new(Waveform::Sawtooth, sample_rate),
                Oscillator::new(Waveform::Sawtooth, sample_rate).with_phase(0.37),
            ],
            filters: [
                Biquad::new(FilterType::LowPass, sample_rate, CUTOFFS_HZ[0], 1.4),
                Biquad::new(FilterType::LowPass, sample_rate, CUTOFFS_HZ[1], 1.1),
            ],
            sub: Oscillator::new(Waveform::Sine, sample_rate),
            lfo: Oscillator::new(Waveform::Sine, sample_rate),
            lfo_value: 0.0,
            countdown: 0,
        }
    }
}

impl Signal for DroneSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let lfo = self.lfo.next_sample(LFO_HZ) as f64;
        if self.countdown == 0 {
            self.lfo_value = lfo;
            for (filter, base) in self.filters.iter_mut().zip(CUTOFFS_HZ) {
                filter.set_cutoff(base + LFO_DEPTH_HZ * self.lfo_value);
            }
            self.countdown = MODULATION_INTERVAL;
        }
        self.countdown -= 1;

        let detune = 2f64.powf(DETUNE_CENTS / 1200.0);
        let upper = self.saws[0].next_sample(DRONE_ROOT_HZ * detune);
        let lower = self.saws[1].next_sample(DRONE_ROOT_HZ / detune);
        let layered = self.filters[0].process(upper) + self.filters[1].process(lower);
        let sub = self.sub.next_sample(DRONE_ROOT_HZ / 2.0) * SUB_LEVEL;

        Some((layered + sub) * 0.5)
    }
}
