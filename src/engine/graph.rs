//! Rendering graph
//!
//! A flat mixer: every voice is a [`Signal`] with its own gain parameter,
//! summed into the master bus. Voices start at a scheduled time and end when
//! their signal runs out or their stop time passes; ended voices are removed
//! and reported to the caller.

use std::collections::BTreeMap;

use crate::dsp::AudioParam;

/// A mono sample generator
pub trait Signal: Send {
    /// Produce the sample for `time` (seconds), or `None` once exhausted
    fn next_sample(&mut self, time: f64) -> Option<f32>;

    /// Frequency parameter of signals that can be retuned live
    fn frequency_mut(&mut self) -> Option<&mut AudioParam> {
        None
    }
}

/// Identifier of a voice in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Why a voice left the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The signal ran out on its own
    Exhausted,
    /// The scheduled stop time passed
    Stopped,
}

struct Voice {
    signal: Box<dyn Signal>,
    gain: AudioParam,
    start_at: f64,
    stop_at: Option<f64>,
}

/// The engine's single output graph
pub struct AudioGraph {
    sample_rate: f64,
    frame: u64,
    master: AudioParam,
    voices: BTreeMap<NodeId, Voice>,
    next_id: u64,
}

impl AudioGraph {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        AudioGraph {
            sample_rate: sample_rate as f64,
            frame: 0,
            master: AudioParam::new(master_gain),
            voices: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Time of the next frame to be rendered, in seconds
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    /// Add a voice that starts sounding at `start_at`
    pub fn add_voice(&mut self, signal: Box<dyn Signal>, gain: AudioParam, start_at: f64) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.voices.insert(
            id,
            Voice {
                signal,
                gain,
                start_at,
                stop_at: None,
            },
        );
        id
    }

    /// Schedule a voice to end at `time`
    ///
    /// Returns false if the voice is already gone.
    pub fn stop_at(&mut self, id: NodeId, time: f64) -> bool {
        match self.voices.get_mut(&id) {
            Some(voice) => {
                voice.stop_at = Some(time);
                true
            }
            None => false,
        }
    }

    /// Scheduled stop time of a voice
    pub fn scheduled_stop(&self, id: NodeId) -> Option<f64> {
        self.voices.get(&id).and_then(|voice| voice.stop_at)
    }

    pub fn gain_mut(&mut self, id: NodeId) -> Option<&mut AudioParam> {
        self.voices.get_mut(&id).map(|voice| &mut voice.gain)
    }

    pub fn gain(&self, id: NodeId) -> Option<&AudioParam> {
        self.voices.get(&id).map(|voice| &voice.gain)
    }

    pub fn signal_mut(&mut self, id: NodeId) -> Option<&mut (dyn Signal + 'static)> {
        self.voices.get_mut(&id).map(|voice| voice.signal.as_mut())
    }

    pub fn master_mut(&mut self) -> &mut AudioParam {
        &mut self.master
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.voices.contains_key(&id)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Render `out.len()` frames, overwriting `out`
    ///
    /// Returns the voices that ended during this block; they are already
    /// removed from the graph.
    pub fn render(&mut self, out: &mut [f32]) -> Vec<(NodeId, EndReason)> {
        out.fill(0.0);

        let sample_rate = self.sample_rate;
        let first_frame = self.frame;
        let mut ended = Vec::new();

        for (&id, voice) in self.voices.iter_mut() {
            for (i, slot) in out.iter_mut().enumerate() {
                let time = (first_frame + i as u64) as f64 / sample_rate;
                if time < voice.start_at {
                    continue;
                }
                if voice.stop_at.is_some_and(|stop| time >= stop) {
                    ended.push((id, EndReason::Stopped));
                    break;
                }
                match voice.signal.next_sample(time) {
                    Some(sample) => *slot += sample * voice.gain.value_at(time),
                    None => {
                        ended.push((id, EndReason::Exhausted));
                        break;
                    }
                }
            }
        }

        for (i, slot) in out.iter_mut().enumerate() {
            let time = (first_frame + i as u64) as f64 / sample_rate;
            *slot *= self.master.value_at(time);
        }

        for (id, _) in &ended {
            self.voices.remove(id);
        }

        self.frame += out.len() as u64;
        let now = self.current_time();
        for voice in self.voices.values_mut() {
            voice.gain.prune(now);
        }
        self.master.prune(now);

        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant {
        remaining: Option<usize>,
    }

    impl Signal for Constant {
        fn next_sample(&mut self, _time: f64) -> Option<f32> {
            match self.remaining.as_mut() {
                Some(0) => None,
                Some(n) => {
                    *n -= 1;
                    Some(1.0)
                }
                None => Some(1.0),
            }
        }
    }

    fn constant(remaining: Option<usize>) -> Box<dyn Signal> {
        Box::new(Constant { remaining })
    }

    #[test]
    fn test_voices_are_summed_with_gain() {
        let mut graph = AudioGraph::new(1000, 1.0);
        graph.add_voice(constant(None), AudioParam::new(0.25), 0.0);
        graph.add_voice(constant(None), AudioParam::new(0.5), 0.0);

        let mut out = [0.0; 8];
        assert!(graph.render(&mut out).is_empty());
        assert!(out.iter().all(|s| (s - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_master_gain_applies() {
        let mut graph = AudioGraph::new(1000, 0.5);
        graph.add_voice(constant(None), AudioParam::new(1.0), 0.0);
        let mut out = [0.0; 4];
        graph.render(&mut out);
        assert_eq!(out, [0.5; 4]);
    }

    #[test]
    fn test_start_time_delays_voice() {
        let mut graph = AudioGraph::new(1000, 1.0);
        graph.add_voice(constant(None), AudioParam::new(1.0), 0.004);
        let mut out = [0.0; 8];
        graph.render(&mut out);
        assert_eq!(&out[..4], &[0.0; 4]);
        assert_eq!(&out[4..], &[1.0; 4]);
    }

    #[test]
    fn test_exhausted_voice_is_reported_and_removed() {
        let mut graph = AudioGraph::new(1000, 1.0);
        let id = graph.add_voice(constant(Some(3)), AudioParam::new(1.0), 0.0);
        let mut out = [0.0; 8];
        let ended = graph.render(&mut out);

        assert_eq!(ended, vec![(id, EndReason::Exhausted)]);
        assert!(!graph.contains(id));
        assert_eq!(out.iter().filter(|s| **s > 0.0).count(), 3);
    }

    #[test]
    fn test_stop_time_ends_voice() {
        let mut graph = AudioGraph::new(1000, 1.0);
        let id = graph.add_voice(constant(None), AudioParam::new(1.0), 0.0);
        assert!(graph.stop_at(id, 0.005));

        let mut out = [0.0; 8];
        let ended = graph.render(&mut out);
        assert_eq!(ended, vec![(id, EndReason::Stopped)]);
        assert_eq!(out.iter().filter(|s| **s > 0.0).count(), 5);
        assert!(!graph.stop_at(id, 1.0));
    }

    #[test]
    fn test_clock_advances() {
        let mut graph = AudioGraph::new(1000, 1.0);
        let mut out = [0.0; 250];
        graph.render(&mut out);
        assert!((graph.current_time() - 0.25).abs() < 1e-12);
    }
}
