//! Interaction sounds
//!
//! The six nature layers the UI can start and stop, the per-category policy
//! table that drives them, and the channel bookkeeping shared by sampled and
//! synthesized playback.

mod active;
mod channel;
pub mod ducking;
pub mod pitch;
mod policy;
mod sampled;
pub mod synth;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AmbienceError;

pub use active::ActiveSoundSet;
pub use channel::{
    Channel, ChannelHandle, ChannelId, ChannelInfo, ChannelTable, NaturalEndCallback, SourceKind,
};
pub use ducking::DuckingLevels;
pub use pitch::MappingMode;
pub use policy::{policy, NoiseColor, SoundPolicy, SynthRecipe, POLICIES};
pub use sampled::{SampleBuffer, SampleSignal};

/// Identifier of an interaction sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoundId {
    Bird,
    Wind,
    Leaves,
    Water,
    Rain,
    Insect,
}

impl SoundId {
    /// Every sound, in table order
    pub const ALL: [SoundId; 6] = [
        SoundId::Bird,
        SoundId::Wind,
        SoundId::Leaves,
        SoundId::Water,
        SoundId::Rain,
        SoundId::Insect,
    ];

    /// Position in [`SoundId::ALL`] and the policy table
    pub fn index(self) -> usize {
        match self {
            SoundId::Bird => 0,
            SoundId::Wind => 1,
            SoundId::Leaves => 2,
            SoundId::Water => 3,
            SoundId::Rain => 4,
            SoundId::Insect => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoundId::Bird => "BIRD",
            SoundId::Wind => "WIND",
            SoundId::Leaves => "LEAVES",
            SoundId::Water => "WATER",
            SoundId::Rain => "RAIN",
            SoundId::Insect => "INSECT",
        }
    }

    /// The policy row for this sound
    pub fn policy(self) -> &'static SoundPolicy {
        policy(self)
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundId {
    type Err = AmbienceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AmbienceError::InvalidOperation {
                reason: format!("unknown sound '{s}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, id) in SoundId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(id.policy().id, *id);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("rain".parse::<SoundId>().unwrap(), SoundId::Rain);
        assert_eq!(" Bird ".parse::<SoundId>().unwrap(), SoundId::Bird);
        assert!("thunder".parse::<SoundId>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case() {
        let json = serde_json::to_string(&SoundId::Leaves).unwrap();
        assert_eq!(json, "\"LEAVES\"");
        let back: SoundId = serde_json::from_str("\"INSECT\"").unwrap();
        assert_eq!(back, SoundId::Insect);
    }
}
