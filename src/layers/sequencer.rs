//! Generative sequencer ("piano")
//!
//! Plays a soft triangle note picked at random from a fixed scale, then
//! schedules the next one after a random pause. At most one timer is pending
//! at any time; disabling cancels it and lets sounding notes ring out.

use log::{debug, info};
use rand::Rng;

use crate::dsp::envelope::EXPONENTIAL_FLOOR;
use crate::dsp::{AudioParam, Biquad, FilterType, Oscillator, Waveform};
use crate::engine::graph::{AudioGraph, NodeId, Signal};
use crate::engine::scheduler::{Scheduler, TimerId};
use crate::engine::EngineTimer;

/// The scale notes are drawn from (C major pentatonic, C4 to D5)
pub const SCALE_HZ: [f64; 7] = [261.63, 293.66, 329.63, 392.00, 440.00, 523.25, 587.33];

/// Velocity band, as linear gain
pub const VELOCITY_MIN: f32 = 0.04;
pub const VELOCITY_MAX: f32 = 0.07;

pub const NOTE_ATTACK_SECS: f64 = 0.1;
pub const NOTE_DECAY_SECS: f64 = 4.0;

/// Pause before the next note, in seconds: [min, max)
pub const INTERVAL_MIN_SECS: f64 = 2.0;
pub const INTERVAL_MAX_SECS: f64 = 5.0;

/// Self-rescheduling note generator
#[derive(Debug, Default)]
pub struct Sequencer {
    enabled: bool,
    pending: Option<TimerId>,
    notes_played: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn notes_played(&self) -> u64 {
        self.notes_played
    }

    /// Start generating; plays a note right away unless one is already queued
    pub fn enable<R: Rng + ?Sized>(
        &mut self,
        graph: &mut AudioGraph,
        scheduler: &mut Scheduler<EngineTimer>,
        rng: &mut R,
    ) {
        self.enabled = true;
        if self.pending.is_some() {
            debug!("[PIANO] Already scheduled");
            return;
        }
        info!("[PIANO] Enabled at {:.3}s", graph.current_time());
        self.play_and_reschedule(graph, scheduler, rng);
    }

    /// Stop scheduling; notes already sounding decay naturally
    pub fn disable(&mut self, scheduler: &mut Scheduler<EngineTimer>) {
        self.enabled = false;
        if let Some(timer) = self.pending.take() {
            scheduler.cancel(timer);
            info!("[PIANO] Disabled, pending note cancelled");
        }
    }

    /// Handle a fired timer; returns true if it belonged to this sequencer
    pub fn on_timer<R: Rng + ?Sized>(
        &mut self,
        timer: TimerId,
        graph: &mut AudioGraph,
        scheduler: &mut Scheduler<EngineTimer>,
        rng: &mut R,
    ) -> bool {
        if self.pending != Some(timer) {
            return false;
        }
        self.pending = None;
        if self.enabled {
            self.play_and_reschedule(graph, scheduler, rng);
        }
        true
    }

    fn play_and_reschedule<R: Rng + ?Sized>(
        &mut self,
        graph: &mut AudioGraph,
        scheduler: &mut Scheduler<EngineTimer>,
        rng: &mut R,
    ) {
        let frequency = SCALE_HZ[rng.random_range(0..SCALE_HZ.len())];
        let velocity = rng.random_range(VELOCITY_MIN..VELOCITY_MAX);
        play_note(graph, frequency, velocity);
        self.notes_played += 1;

        let delay = rng.random_range(INTERVAL_MIN_SECS..INTERVAL_MAX_SECS);
        let due = graph.current_time() + delay;
        self.pending = Some(scheduler.schedule(due, EngineTimer::SequencerNote));
        debug!(
            "[PIANO] Note {:.2} Hz at velocity {:.3}, next in {:.2}s",
            frequency, velocity, delay
        );
    }
}

/// Add one decaying note to the graph
pub fn play_note(graph: &mut AudioGraph, frequency: f64, velocity: f32) -> NodeId {
    let now = graph.current_time();
    let mut gain = AudioParam::new(0.0);
    gain.set_value_at_time(0.0, now);
    gain.linear_ramp_to_value_at_time(velocity, now + NOTE_ATTACK_SECS);
    gain.exponential_ramp_to_value_at_time(
        EXPONENTIAL_FLOOR,
        now + NOTE_ATTACK_SECS + NOTE_DECAY_SECS,
    );

    let sample_rate = graph.sample_rate();
    let signal = NoteSignal {
        oscillator: Oscillator::new(Waveform::Triangle, sample_rate),
        filter: Biquad::new(FilterType::LowPass, sample_rate, frequency * 3.0, 0.7),
        frequency,
    };
    let node = graph.add_voice(Box::new(signal), gain, now);
    graph.stop_at(node, now + NOTE_ATTACK_SECS + NOTE_DECAY_SECS + 0.05);
    node
}

struct NoteSignal {
    oscillator: Oscillator,
    filter: Biquad,
    frequency: f64,
}

impl Signal for NoteSignal {
    fn next_sample(&mut self, _time: f64) -> Option<f32> {
        let raw = self.oscillator.next_sample(self.frequency);
        Some(self.filter.process(raw))
    }
}
