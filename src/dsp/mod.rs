//! DSP building blocks
//!
//! Parameter automation, the envelope controller, oscillators, filters and
//! noise. Everything here is allocation-free per sample and knows nothing
//! about sounds, channels or layers.

pub mod envelope;
pub mod filter;
pub mod noise;
pub mod oscillator;
pub mod param;

pub use filter::{Biquad, FilterType};
pub use noise::{BrownNoise, WhiteNoise};
pub use oscillator::{Oscillator, Waveform};
pub use param::{AudioParam, ParamEvent};
