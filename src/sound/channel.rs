//! Channel table and stop handles
//!
//! Channels live only in the engine's [`ChannelTable`]. The UI gets a
//! [`ChannelHandle`], which names a channel by id and can ask the engine to
//! release it; it never touches graph nodes itself.

use std::collections::BTreeMap;
use std::fmt;

use super::SoundId;
use crate::engine::graph::NodeId;
use crate::engine::AmbientEngine;

/// Called once when a one-shot channel reaches its natural end
pub type NaturalEndCallback = Box<dyn FnOnce() + Send>;

/// Generated identifier of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

/// Where a channel's audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A decoded asset
    Sampled,
    /// The synthesis fallback
    Synthesized,
}

/// One live sound
pub struct Channel {
    pub sound: SoundId,
    pub node: NodeId,
    pub source: SourceKind,
    /// Pitch multiplier applied at start
    pub rate: f64,
    /// Gain the channel is heading to (changes with ducking)
    pub target_gain: f32,
    /// Set once a release has scheduled the fade-out
    pub stopping: bool,
    on_natural_end: Option<NaturalEndCallback>,
}

impl Channel {
    pub fn new(
        sound: SoundId,
        node: NodeId,
        source: SourceKind,
        rate: f64,
        target_gain: f32,
        on_natural_end: Option<NaturalEndCallback>,
    ) -> Self {
        Channel {
            sound,
            node,
            source,
            rate,
            target_gain,
            stopping: false,
            on_natural_end,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.source == SourceKind::Synthesized
    }

    /// Take the natural-end callback, leaving none behind
    pub fn take_callback(&mut self) -> Option<NaturalEndCallback> {
        self.on_natural_end.take()
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            sound: self.sound,
            source: self.source,
            rate: self.rate,
            target_gain: self.target_gain,
            stopping: self.stopping,
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("sound", &self.sound)
            .field("node", &self.node)
            .field("source", &self.source)
            .field("rate", &self.rate)
            .field("target_gain", &self.target_gain)
            .field("stopping", &self.stopping)
            .field("has_callback", &self.on_natural_end.is_some())
            .finish()
    }
}

/// Read-only snapshot of a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelInfo {
    pub sound: SoundId,
    pub source: SourceKind,
    pub rate: f64,
    pub target_gain: f32,
    pub stopping: bool,
}

/// Every live channel, keyed by generated id
#[derive(Debug, Default)]
pub struct ChannelTable {
    channels: BTreeMap<ChannelId, Channel>,
    next_id: u64,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: Channel) -> ChannelId {
        self.next_id += 1;
        let id = ChannelId(self.next_id);
        self.channels.insert(id, channel);
        id
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    pub fn remove(&mut self, id: ChannelId) -> Option<Channel> {
        self.channels.remove(&id)
    }

    /// Find the channel that owns a graph node
    pub fn find_by_node(&self, node: NodeId) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|(_, channel)| channel.node == node)
            .map(|(&id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels.iter().map(|(&id, channel)| (id, channel))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChannelId, &mut Channel)> {
        self.channels.iter_mut().map(|(&id, channel)| (id, channel))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Caller-side stop handle for a started sound
///
/// Handles returned while no output device is available are inert: releasing
/// them does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHandle {
    id: Option<ChannelId>,
    sound: SoundId,
}

impl ChannelHandle {
    pub(crate) fn new(id: ChannelId, sound: SoundId) -> Self {
        ChannelHandle {
            id: Some(id),
            sound,
        }
    }

    /// A handle that controls nothing
    pub fn inert(sound: SoundId) -> Self {
        ChannelHandle { id: None, sound }
    }

    pub fn id(&self) -> Option<ChannelId> {
        self.id
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    pub fn is_inert(&self) -> bool {
        self.id.is_none()
    }

    /// Fade the channel out and release it
    ///
    /// Safe to call more than once; see
    /// [`AmbientEngine::release_channel`].
    pub fn release(&self, engine: &mut AmbientEngine) {
        engine.release_channel(self);
    }
}
