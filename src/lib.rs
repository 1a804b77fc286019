//! Ambience - Interactive Ambient Audio Engine
//!
//! Ambience plays a small set of nature sounds (bird, wind, leaves, water,
//! rain, insect) pitch-mapped to a user's tinnitus frequency, together with
//! two harmony layers and a calibration tone.
//!
//! # Architecture
//!
//! - `dsp`: parameter automation, envelopes, oscillators, filters, noise
//! - `sound`: the per-sound policy table, pitch mapping, sampled and
//!   synthesized channels, ducking
//! - `layers`: drone, generative sequencer, calibration tone
//! - `engine`: rendering graph, scheduler, backends, asset I/O and the
//!   `AmbientEngine` context
//! - `session`: caller-side toggle bookkeeping

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod layers;
pub mod session;
pub mod sound;

pub use config::EngineConfig;
pub use engine::{AmbientEngine, EnginePhase};
pub use error::{AmbienceError, Result};
pub use layers::DroneState;
pub use session::InteractionSession;
pub use sound::{ChannelHandle, SoundId};
