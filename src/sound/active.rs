//! The set of sounds the UI currently has engaged

use std::collections::BTreeSet;

use super::SoundId;

/// Sounds that are currently started
///
/// Membership is by identifier only: two channels of the same sound count
/// once. The engine drops the identifier when no non-stopping channel of
/// that sound remains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSoundSet {
    sounds: BTreeSet<SoundId>,
}

impl ActiveSoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the sound was not already present
    pub fn insert(&mut self, id: SoundId) -> bool {
        self.sounds.insert(id)
    }

    /// Returns true if the sound was present
    pub fn remove(&mut self, id: SoundId) -> bool {
        self.sounds.remove(&id)
    }

    pub fn contains(&self, id: SoundId) -> bool {
        self.sounds.contains(&id)
    }

    /// True if any sound other than `id` is active
    pub fn contains_other_than(&self, id: SoundId) -> bool {
        self.sounds.iter().any(|&other| other != id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SoundId> + '_ {
        self.sounds.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
