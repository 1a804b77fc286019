//! Ducking coordinator
//!
//! The ambient bed (RAIN) drops to its ducked level whenever any other sound
//! is active and returns to full level when it is alone. Changes glide with a
//! time constant instead of stepping.

use log::debug;

use super::{ActiveSoundSet, ChannelTable, SoundPolicy};
use crate::dsp::envelope;
use crate::engine::graph::AudioGraph;

/// Time constant of ducking transitions, in seconds
pub const DUCK_TIME_CONSTANT: f64 = 0.5;

/// Full and ducked gains of a duckable sound, per source kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckingLevels {
    /// (full, ducked) when playing the sampled asset
    pub sampled: (f32, f32),
    /// (full, ducked) when playing the synthesis fallback
    pub synthesized: (f32, f32),
}

impl DuckingLevels {
    pub fn level(&self, synthesized: bool, ducked: bool) -> f32 {
        let (full, low) = if synthesized {
            self.synthesized
        } else {
            self.sampled
        };
        if ducked {
            low
        } else {
            full
        }
    }
}

/// Gain a channel of `policy` should have given the current active set
pub fn target_gain(policy: &SoundPolicy, synthesized: bool, active: &ActiveSoundSet) -> f32 {
    match &policy.ducking {
        Some(levels) => levels.level(synthesized, active.contains_other_than(policy.id)),
        None => policy.base_gain(synthesized),
    }
}

/// Re-target every duckable channel against `active`
///
/// Channels that are fading out are left alone. Returns how many channels
/// were re-targeted.
pub fn recompute(graph: &mut AudioGraph, channels: &mut ChannelTable, active: &ActiveSoundSet) -> usize {
    let now = graph.current_time();
    let mut changed = 0;

    for (id, channel) in channels.iter_mut() {
        let policy = channel.sound.policy();
        if policy.ducking.is_none() || channel.stopping {
            continue;
        }

        let target = target_gain(policy, channel.is_synthesized(), active);
        if (target - channel.target_gain).abs() < f32::EPSILON {
            continue;
        }

        if let Some(gain) = graph.gain_mut(channel.node) {
            envelope::glide_to(gain, now, target, DUCK_TIME_CONSTANT);
            debug!(
                "[DUCK] {} channel {:?}: {:.3} -> {:.3}",
                channel.sound, id, channel.target_gain, target
            );
            channel.target_gain = target;
            changed += 1;
        }
    }

    changed
}
