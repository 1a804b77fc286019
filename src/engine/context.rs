//! Ambient engine
//!
//! The single context object the UI talks to. It owns the rendering graph,
//! the decoded assets, the channel table with its active-sound set, both
//! harmony layers and the calibration tone. Operations never fail: missing
//! assets fall back to synthesis and a missing device turns every call into a
//! no-op that hands back inert handles.

use std::fmt;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::EngineConfig;
use crate::dsp::{envelope, AudioParam};
use crate::engine::backend::{AudioBackend, OfflineBackend};
use crate::engine::graph::{AudioGraph, EndReason, NodeId, Signal};
use crate::engine::io::{self, AssetBank, AssetSource, DirectoryAssets, LoadReport};
use crate::engine::scheduler::Scheduler;
use crate::layers::{CalibrationTone, DroneLayer, DroneState, Sequencer};
use crate::sound::pitch::{clamp_calibration_frequency, BASE_FREQUENCY};
use crate::sound::{
    ducking, synth, ActiveSoundSet, Channel, ChannelHandle, ChannelInfo, ChannelTable,
    NaturalEndCallback, SampleBuffer, SampleSignal, SoundId, SourceKind,
};

/// Frames rendered between two rounds of event processing
pub const RENDER_QUANTUM: usize = 128;

/// Time a released voice keeps running after its fade-out completes
const RELEASE_MARGIN_SECS: f64 = 0.05;

/// Ramp used when the master gain changes
const MASTER_RAMP_SECS: f64 = 0.05;

/// Which part of the session the user is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    /// Matching the tinnitus frequency
    #[default]
    Calibration,
    /// Interacting with the soundscape
    Ambient,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Calibration => write!(f, "Calibration"),
            EnginePhase::Ambient => write!(f, "Ambient"),
        }
    }
}

/// Payload of engine timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTimer {
    SequencerNote,
}

/// The interactive ambient-audio engine
pub struct AmbientEngine {
    config: EngineConfig,
    backend: Box<dyn AudioBackend>,
    graph: Option<AudioGraph>,
    device_error: Option<String>,

    assets: AssetBank,
    channels: ChannelTable,
    active: ActiveSoundSet,

    drone: DroneLayer,
    sequencer: Sequencer,
    tone: CalibrationTone,
    scheduler: Scheduler<EngineTimer>,
    rng: Pcg32,

    reference_frequency: f64,
    phase: EnginePhase,
}

impl AmbientEngine {
    /// Engine rendering through an [`OfflineBackend`]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(OfflineBackend::new()))
    }

    pub fn with_backend(config: EngineConfig, backend: Box<dyn AudioBackend>) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!("[ENGINE] RNG seed {}", seed);
        AmbientEngine {
            config,
            backend,
            graph: None,
            device_error: None,
            assets: AssetBank::new(),
            channels: ChannelTable::new(),
            active: ActiveSoundSet::new(),
            drone: DroneLayer::new(),
            sequencer: Sequencer::new(),
            tone: CalibrationTone::new(),
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            reference_frequency: BASE_FREQUENCY,
            phase: EnginePhase::Calibration,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the output backend and build the graph
    ///
    /// Idempotent; a later call also resumes a suspended device. Returns
    /// false when no device is available, in which case every operation is a
    /// no-op.
    pub fn initialize(&mut self) -> bool {
        if self.graph.is_none() {
            if let Err(e) = self.config.validate() {
                warn!("[ENGINE] Audio disabled: {}", e);
                self.device_error = Some(e.to_string());
                return false;
            }
            match self.backend.open(self.config.sample_rate) {
                Ok(rate) => {
                    let master = self.config.master_gain.clamp(0.0, 1.0);
                    self.graph = Some(AudioGraph::new(rate, master));
                    self.device_error = None;
                    info!(
                        "[ENGINE] Initialized {} backend at {} Hz",
                        self.backend.name(),
                        rate
                    );
                }
                Err(e) => {
                    warn!("[ENGINE] Audio disabled: {}", e);
                    self.device_error = Some(e.to_string());
                    return false;
                }
            }
        }

        if self.backend.is_suspended() {
            match self.backend.resume() {
                Ok(()) => debug!("[ENGINE] Backend resumed"),
                Err(e) => warn!("[ENGINE] Backend resume failed: {}", e),
            }
        }
        true
    }

    /// Initialize on first use unless the device already failed
    fn ensure_initialized(&mut self) -> bool {
        if self.graph.is_some() {
            return true;
        }
        if self.device_error.is_some() {
            return false;
        }
        self.initialize()
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    /// Why the device could not be opened, if it could not
    pub fn device_error(&self) -> Option<&str> {
        self.device_error.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Assets
    // ========================================================================

    /// Fetch and decode every asset from `source`
    ///
    /// Each failure only switches that sound to its synthesized fallback.
    pub async fn load_assets<S: AssetSource>(&mut self, source: &S) -> LoadReport {
        let report = io::load_all(source, &mut self.assets).await;
        info!(
            "[ENGINE] Assets: {} loaded, {} synthesized",
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    /// Load from the configured asset directory, if one is set
    pub async fn load_configured_assets(&mut self) -> Option<LoadReport> {
        let dir = self.config.asset_dir.clone()?;
        Some(self.load_assets(&DirectoryAssets::new(dir)).await)
    }

    /// Install an already decoded buffer
    pub fn insert_asset(&mut self, sound: SoundId, buffer: SampleBuffer) {
        self.assets.insert(sound, buffer);
    }

    pub fn has_asset(&self, sound: SoundId) -> bool {
        self.assets.contains(sound)
    }

    // ========================================================================
    // Interaction sounds
    // ========================================================================

    /// Start `sound` pitch-mapped to `reference_frequency`
    ///
    /// Plays the decoded asset when there is one and the synthesized
    /// equivalent otherwise. One-shot sounds fade out at their natural end
    /// and then invoke `on_natural_end`. Returns an inert handle when no
    /// device is available.
    pub fn start_interaction_sound(
        &mut self,
        sound: SoundId,
        reference_frequency: f64,
        on_natural_end: Option<NaturalEndCallback>,
    ) -> ChannelHandle {
        if !self.ensure_initialized() {
            return ChannelHandle::inert(sound);
        }
        let Some(graph) = self.graph.as_mut() else {
            return ChannelHandle::inert(sound);
        };

        let policy = sound.policy();
        let multiplier = policy.mapping.multiplier(reference_frequency);
        let sample_rate = graph.sample_rate();

        let (signal, source, duration): (Box<dyn Signal>, SourceKind, Option<f64>) =
            match self.assets.get(sound) {
                Some(buffer) => {
                    let duration = (!policy.looping)
                        .then(|| SampleSignal::natural_duration(buffer, multiplier));
                    let signal =
                        SampleSignal::new(buffer.clone(), multiplier, sample_rate, policy.looping);
                    (Box::new(signal), SourceKind::Sampled, duration)
                }
                None => {
                    let seed = self.rng.random();
                    let signal = synth::build(&policy.recipe, multiplier, sample_rate, seed);
                    let duration = if policy.looping {
                        None
                    } else {
                        synth::duration(&policy.recipe, multiplier)
                    };
                    (signal, SourceKind::Synthesized, duration)
                }
            };

        self.active.insert(sound);
        let synthesized = source == SourceKind::Synthesized;
        let target = ducking::target_gain(policy, synthesized, &self.active);

        let now = graph.current_time();
        let mut gain = AudioParam::new(0.0);
        envelope::fade_in(&mut gain, now, target, policy.fade_in_secs, duration);
        let node = graph.add_voice(signal, gain, now);

        let id = self.channels.insert(Channel::new(
            sound,
            node,
            source,
            multiplier,
            target,
            on_natural_end,
        ));
        ducking::recompute(graph, &mut self.channels, &self.active);

        info!(
            "[SOUND] {} started ({:?}, x{:.3}, gain {:.3})",
            sound, source, multiplier, target
        );
        ChannelHandle::new(id, sound)
    }

    /// Fade a channel out and tear it down
    ///
    /// The sound leaves the active set immediately, not when the fade ends.
    /// Releasing an inert, already-released or finished handle is a no-op.
    pub fn release_channel(&mut self, handle: &ChannelHandle) {
        let Some(id) = handle.id() else {
            debug!("[SOUND] Release of inert {} handle ignored", handle.sound());
            return;
        };
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        let now = graph.current_time();
        match self.channels.get_mut(id) {
            Some(channel) if !channel.stopping => {
                channel.stopping = true;
                let fade = channel.sound.policy().fade_out_secs;
                if let Some(gain) = graph.gain_mut(channel.node) {
                    envelope::fade_out(gain, now, fade);
                }
                graph.stop_at(channel.node, now + fade + RELEASE_MARGIN_SECS);
                info!("[SOUND] {} released, fading over {:.2}s", channel.sound, fade);
            }
            Some(_) => debug!("[SOUND] {} already stopping", handle.sound()),
            None => debug!("[SOUND] {} already finished", handle.sound()),
        }

        self.sync_membership(handle.sound());
    }

    /// Sounds currently in the active set
    pub fn active_sounds(&self) -> Vec<SoundId> {
        self.active.iter().collect()
    }

    pub fn is_sound_active(&self, sound: SoundId) -> bool {
        self.active.contains(sound)
    }

    /// Snapshot of the channel behind `handle`, while it is alive
    pub fn channel_info(&self, handle: &ChannelHandle) -> Option<ChannelInfo> {
        handle
            .id()
            .and_then(|id| self.channels.get(id))
            .map(Channel::info)
    }

    /// Gain of the channel behind `handle` at engine time `time`
    pub fn channel_gain_at(&self, handle: &ChannelHandle, time: f64) -> Option<f32> {
        let node = handle.id().and_then(|id| self.channels.get(id))?.node;
        self.graph
            .as_ref()
            .and_then(|graph| graph.gain(node))
            .map(|gain| gain.value_at(time))
    }

    /// Number of live channels, including ones fading out
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Drop `sound` from the active set unless another live channel plays it,
    /// then re-target ducking
    fn sync_membership(&mut self, sound: SoundId) {
        let still_playing = self
            .channels
            .iter()
            .any(|(_, channel)| channel.sound == sound && !channel.stopping);
        if !still_playing {
            self.active.remove(sound);
        }
        if let Some(graph) = self.graph.as_mut() {
            ducking::recompute(graph, &mut self.channels, &self.active);
        }
    }

    // ========================================================================
    // Harmony layers
    // ========================================================================

    pub fn toggle_drone(&mut self, enabled: bool) {
        if !self.ensure_initialized() {
            return;
        }
        if let Some(graph) = self.graph.as_mut() {
            if enabled {
                self.drone.enable(graph);
            } else {
                self.drone.disable(graph);
            }
        }
    }

    pub fn toggle_piano(&mut self, enabled: bool) {
        if !enabled {
            self.sequencer.disable(&mut self.scheduler);
            return;
        }
        if !self.ensure_initialized() {
            return;
        }
        if let Some(graph) = self.graph.as_mut() {
            self.sequencer
                .enable(graph, &mut self.scheduler, &mut self.rng);
        }
    }

    pub fn drone_state(&self) -> DroneState {
        match &self.graph {
            Some(graph) => self.drone.state(graph.current_time()),
            None => DroneState::Off,
        }
    }

    pub fn piano_enabled(&self) -> bool {
        self.sequencer.is_enabled()
    }

    /// Timers waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    // ========================================================================
    // Calibration
    // ========================================================================

    /// Start the calibration tone, replacing any tone already playing
    pub fn start_calibration_tone(&mut self, frequency: f64, gain: f32) {
        if !self.ensure_initialized() {
            return;
        }
        if let Some(graph) = self.graph.as_mut() {
            self.tone.start(graph, frequency, gain);
        }
    }

    /// Glide the playing tone to `frequency`
    pub fn update_calibration_tone(&mut self, frequency: f64) {
        if let Some(graph) = self.graph.as_mut() {
            self.tone.update(graph, frequency);
        }
    }

    /// Fade the tone out; safe when nothing is playing
    pub fn stop_calibration_tone(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            self.tone.stop(graph);
        }
    }

    pub fn calibration_tone_playing(&self) -> bool {
        self.tone.is_playing()
    }

    /// Enter the ambient phase with the calibrated frequency
    ///
    /// There is no separate bed layer; the interaction sounds are the bed.
    pub fn start_ambient_bed(&mut self, reference_frequency: f64) {
        self.set_reference_frequency(reference_frequency);
        self.phase = EnginePhase::Ambient;
        info!(
            "[ENGINE] Ambient phase at {:.1} Hz (no bed layer)",
            self.reference_frequency
        );
    }

    pub fn set_reference_frequency(&mut self, frequency: f64) {
        self.reference_frequency = clamp_calibration_frequency(frequency);
    }

    pub fn reference_frequency(&self) -> f64 {
        self.reference_frequency
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Ramp the master bus to `gain` (clamped to 0.0..=1.0)
    ///
    /// Non-finite gains are ignored.
    pub fn set_master_gain(&mut self, gain: f32) {
        if !gain.is_finite() {
            warn!("[ENGINE] Ignoring master gain {}", gain);
            return;
        }
        let gain = gain.clamp(0.0, 1.0);
        self.config.master_gain = gain;
        if let Some(graph) = self.graph.as_mut() {
            let now = graph.current_time();
            envelope::ramp_to(graph.master_mut(), now, gain, MASTER_RAMP_SECS);
        }
    }

    /// Engine clock in seconds; 0.0 before initialization
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, AudioGraph::current_time)
    }

    /// Output sample rate, once initialized
    pub fn sample_rate(&self) -> Option<u32> {
        self.graph.as_ref().map(|graph| graph.sample_rate() as u32)
    }

    /// Voices currently in the graph
    pub fn voice_count(&self) -> usize {
        self.graph.as_ref().map_or(0, AudioGraph::voice_count)
    }

    /// Render the next `out.len()` mono frames
    ///
    /// Events (ended voices, natural-end callbacks, due timers) are handled
    /// after every render quantum. Outputs silence while no device is open.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.graph.is_none() {
            out.fill(0.0);
            return;
        }
        for block in out.chunks_mut(RENDER_QUANTUM) {
            let ended = match self.graph.as_mut() {
                Some(graph) => graph.render(block),
                None => {
                    block.fill(0.0);
                    continue;
                }
            };
            self.handle_ended(ended);
            self.fire_timers();
        }
    }

    fn handle_ended(&mut self, ended: Vec<(NodeId, EndReason)>) {
        let mut callbacks = Vec::new();

        for (node, reason) in ended {
            self.drone.on_node_ended(node);
            self.tone.on_node_ended(node);

            let Some(id) = self.channels.find_by_node(node) else {
                continue;
            };
            let Some(mut channel) = self.channels.remove(id) else {
                continue;
            };
            if reason == EndReason::Exhausted && !channel.stopping {
                debug!("[SOUND] {} reached its natural end", channel.sound);
                if let Some(callback) = channel.take_callback() {
                    callbacks.push(callback);
                }
            }
            self.sync_membership(channel.sound);
        }

        for callback in callbacks {
            callback();
        }
    }

    fn fire_timers(&mut self) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        for (timer, payload) in self.scheduler.take_due(graph.current_time()) {
            match payload {
                EngineTimer::SequencerNote => {
                    self.sequencer
                        .on_timer(timer, graph, &mut self.scheduler, &mut self.rng);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::UnavailableBackend;

    fn engine() -> AmbientEngine {
        AmbientEngine::new(EngineConfig::seeded(11))
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut engine = engine();
        assert!(!engine.is_initialized());
        assert!(engine.initialize());
        engine.toggle_drone(true);
        assert!(engine.initialize());
        assert_eq!(engine.voice_count(), 1);
        assert_eq!(engine.sample_rate(), Some(48000));
    }

    #[test]
    fn test_operations_initialize_lazily() {
        let mut engine = engine();
        let handle = engine.start_interaction_sound(SoundId::Wind, 8000.0, None);
        assert!(!handle.is_inert());
        assert!(engine.is_initialized());
    }

    #[test]
    fn test_suspended_backend_is_resumed() {
        let mut engine = AmbientEngine::with_backend(
            EngineConfig::seeded(1),
            Box::new(OfflineBackend::suspended()),
        );
        assert!(engine.initialize());
        assert!(!engine.backend.is_suspended());
    }

    #[test]
    fn test_unavailable_device_makes_everything_noop() {
        let mut engine = AmbientEngine::with_backend(
            EngineConfig::seeded(1),
            Box::new(UnavailableBackend::default()),
        );
        assert!(!engine.initialize());
        assert!(engine.device_error().is_some());

        let handle = engine.start_interaction_sound(SoundId::Rain, 8000.0, None);
        assert!(handle.is_inert());
        handle.release(&mut engine);
        engine.toggle_drone(true);
        engine.toggle_piano(true);
        engine.start_calibration_tone(6000.0, 0.1);
        engine.stop_calibration_tone();

        assert!(engine.active_sounds().is_empty());
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.drone_state(), DroneState::Off);

        let mut out = vec![1.0; 256];
        engine.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_ambient_bed_records_phase() {
        let mut engine = engine();
        assert_eq!(engine.phase(), EnginePhase::Calibration);
        engine.start_ambient_bed(20000.0);
        assert_eq!(engine.phase(), EnginePhase::Ambient);
        assert_eq!(engine.reference_frequency(), 10000.0);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn test_master_gain_is_clamped() {
        let mut engine = engine();
        engine.initialize();
        engine.set_master_gain(3.0);
        assert_eq!(engine.config().master_gain, 1.0);
    }

    #[test]
    fn test_release_keeps_sound_active_while_another_channel_plays_it() {
        let mut engine = engine();
        let first = engine.start_interaction_sound(SoundId::Wind, 8000.0, None);
        let second = engine.start_interaction_sound(SoundId::Wind, 8000.0, None);

        first.release(&mut engine);
        assert!(engine.is_sound_active(SoundId::Wind));
        second.release(&mut engine);
        assert!(!engine.is_sound_active(SoundId::Wind));
    }

    #[test]
    fn test_released_channel_is_torn_down_after_fade() {
        let mut engine = engine();
        let handle = engine.start_interaction_sound(SoundId::Leaves, 8000.0, None);
        let mut block = vec![0.0; 4800];
        engine.render(&mut block);

        handle.release(&mut engine);
        assert!(engine.channel_info(&handle).unwrap().stopping);

        // LEAVES fades over 0.8s
        let mut tail = vec![0.0; 48000];
        engine.render(&mut tail);
        assert!(engine.channel_info(&handle).is_none());
        assert_eq!(engine.channel_count(), 0);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn test_invalid_config_disables_audio() {
        let config = EngineConfig {
            sample_rate: 16,
            ..EngineConfig::seeded(5)
        };
        let mut engine = AmbientEngine::new(config);
        assert!(!engine.initialize());
        assert!(engine.device_error().is_some());

        let handle = engine.start_interaction_sound(SoundId::Wind, 8000.0, None);
        assert!(handle.is_inert());
        engine.toggle_drone(true);
        assert!(engine.active_sounds().is_empty());
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn test_non_finite_master_gain_is_ignored() {
        let mut engine = engine();
        engine.start_interaction_sound(SoundId::Wind, 8000.0, None);
        engine.set_master_gain(f32::NAN);
        engine.set_master_gain(f32::INFINITY);
        engine.set_master_gain(0.5);
        assert_eq!(engine.config().master_gain, 0.5);

        let mut block = vec![0.0; 48000];
        engine.render(&mut block);
        assert!(block.iter().all(|s| s.is_finite()));
        assert!(block.iter().any(|s| *s != 0.0));
    }
}
