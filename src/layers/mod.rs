//! Harmony layers
//!
//! Sound sources that are not tied to a single interaction:
//! - Drone: a sustained pad with fade-in/fade-out lifecycle
//! - Sequencer: self-scheduling generative notes
//! - Tone: the calibration sine

mod drone;
mod sequencer;
mod tone;

pub use drone::{DroneLayer, DroneState, DRONE_FADE_IN_SECS, DRONE_FADE_OUT_SECS, DRONE_GAIN};
pub use sequencer::{play_note, Sequencer, SCALE_HZ};
pub use tone::{CalibrationTone, TONE_FADE_IN_SECS, TONE_FADE_OUT_SECS};
