//! Interaction session
//!
//! Caller-side bookkeeping for a UI with one toggle per sound: remembers the
//! stop handle of each started sound and decides, from the engine's active
//! set, whether a tap starts or stops it.

use std::collections::BTreeMap;

use log::debug;

use crate::engine::AmbientEngine;
use crate::sound::{ChannelHandle, NaturalEndCallback, SoundId};

/// Stop handles keyed by sound
#[derive(Debug, Default)]
pub struct InteractionSession {
    handles: BTreeMap<SoundId, ChannelHandle>,
}

impl InteractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `sound` if it is not active, stop it otherwise
    ///
    /// Returns true if the sound was started.
    pub fn toggle(&mut self, engine: &mut AmbientEngine, sound: SoundId) -> bool {
        self.toggle_with_callback(engine, sound, None)
    }

    /// [`toggle`](Self::toggle) with a callback for one-shot sounds
    pub fn toggle_with_callback(
        &mut self,
        engine: &mut AmbientEngine,
        sound: SoundId,
        on_natural_end: Option<NaturalEndCallback>,
    ) -> bool {
        if engine.is_sound_active(sound) {
            if let Some(handle) = self.handles.remove(&sound) {
                handle.release(engine);
                return false;
            }
            debug!("[SESSION] {} active without a session handle", sound);
        }

        // A one-shot that ended on its own leaves a stale handle behind.
        self.handles.remove(&sound);
        let handle =
            engine.start_interaction_sound(sound, engine.reference_frequency(), on_natural_end);
        if handle.is_inert() {
            return false;
        }
        self.handles.insert(sound, handle);
        true
    }

    /// Release every sound this session started
    pub fn stop_all(&mut self, engine: &mut AmbientEngine) {
        for (_, handle) in std::mem::take(&mut self.handles) {
            handle.release(engine);
        }
    }

    /// Handle held for `sound`, if any
    pub fn handle(&self, sound: SoundId) -> Option<&ChannelHandle> {
        self.handles.get(&sound)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
