//! Asset I/O
//!
//! Fetches the six interaction-sound assets from an [`AssetSource`], decodes
//! them with hound and keeps the results in an [`AssetBank`]. Every asset is
//! loaded independently: a failure only means that sound will be synthesized.
//!
//! Decoded audio is mono 32-bit float at the file's own sample rate; rate
//! compensation happens at playback time.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{info, warn};

use crate::error::{AmbienceError, Result};
use crate::sound::{SampleBuffer, SoundId};

/// Somewhere asset bytes can be fetched from
pub trait AssetSource {
    /// Fetch the raw bytes of `file_name`
    fn fetch(&self, file_name: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Assets read from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryAssets { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn fetch(&self, file_name: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let path = self.root.join(file_name);
        async move { Ok(tokio::fs::read(path).await?) }
    }
}

/// Assets held in memory, keyed by file name
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(file_name.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_file(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(file_name, bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn fetch(&self, file_name: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let result = self.files.get(file_name).cloned().ok_or_else(|| {
            AmbienceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", file_name),
            ))
        });
        async move { result }
    }
}

/// Decoded buffers, one per sound at most
#[derive(Debug, Clone, Default)]
pub struct AssetBank {
    buffers: BTreeMap<SoundId, SampleBuffer>,
}

impl AssetBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sound: SoundId, buffer: SampleBuffer) {
        self.buffers.insert(sound, buffer);
    }

    pub fn get(&self, sound: SoundId) -> Option<&SampleBuffer> {
        self.buffers.get(&sound)
    }

    pub fn contains(&self, sound: SoundId) -> bool {
        self.buffers.contains_key(&sound)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// Outcome of loading the asset set
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<SoundId>,
    pub failed: Vec<(SoundId, AmbienceError)>,
}

impl LoadReport {
    /// True when every sound has a decoded buffer
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Sounds that will use the synthesis fallback
    pub fn fallback_sounds(&self) -> Vec<SoundId> {
        self.failed.iter().map(|(sound, _)| *sound).collect()
    }
}

/// Fetch and decode every sound's asset into `bank`
///
/// Failures are logged and reported, never propagated.
pub async fn load_all<S: AssetSource>(source: &S, bank: &mut AssetBank) -> LoadReport {
    let mut report = LoadReport::default();

    for sound in SoundId::ALL {
        let file_name = sound.policy().asset_file;
        let decoded = match source.fetch(file_name).await {
            Ok(bytes) => decode_wav(&bytes, sound),
            Err(e) => Err(AmbienceError::AssetUnavailable {
                sound,
                reason: e.to_string(),
            }),
        };

        match decoded {
            Ok(buffer) => {
                info!(
                    "[ASSETS] {} loaded ({:.2}s at {} Hz)",
                    sound,
                    buffer.duration_secs(),
                    buffer.sample_rate()
                );
                bank.insert(sound, buffer);
                report.loaded.push(sound);
            }
            Err(e) => {
                warn!("[ASSETS] {} falls back to synthesis: {}", sound, e);
                report.failed.push((sound, e));
            }
        }
    }

    report
}

/// Decode WAV bytes into a mono buffer
///
/// Multi-channel files are mixed down by averaging the channels.
pub fn decode_wav(bytes: &[u8], sound: SoundId) -> Result<SampleBuffer> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|source| AmbienceError::AssetDecode { sound, source })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved = read_samples_as_f32(reader, spec)
        .map_err(|source| AmbienceError::AssetDecode { sound, source })?;

    if interleaved.len() < channels {
        return Err(AmbienceError::AssetUnavailable {
            sound,
            reason: "asset contains no audio".to_string(),
        });
    }

    let mono = mix_down(&interleaved, channels);
    Ok(SampleBuffer::new(mono, spec.sample_rate))
}

/// Write mono samples to a WAV file
///
/// `bit_depth` is 16 or 24 for integer output, 32 for float.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, bit_depth: u16) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec)?;
    match bit_depth {
        16 => {
            for sample in samples {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        24 => {
            for sample in samples {
                // 24-bit stored as i32 in hound
                writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
            }
        }
        32 => {
            for sample in samples {
                writer.write_sample(*sample)?;
            }
        }
        _ => {
            return Err(AmbienceError::InvalidConfig {
                reason: format!("{}-bit output (only 16, 24, 32 supported)", bit_depth),
            });
        }
    }
    writer.finalize()?;
    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    spec: WavSpec,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => return Err(hound::Error::Unsupported),
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}

fn mix_down(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn wav_bytes(spec: WavSpec, frames: &[[f32; 2]]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for sample in frame.iter().take(spec.channels as usize) {
                    match spec.sample_format {
                        SampleFormat::Float => writer.write_sample(*sample).unwrap(),
                        SampleFormat::Int => {
                            writer.write_sample((*sample * 32767.0) as i16).unwrap()
                        }
                    }
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_mixes_down() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, &[[1.0, 0.0], [0.5, 0.5], [-1.0, 0.0]]);
        let buffer = decode_wav(&bytes, SoundId::Wind).unwrap();

        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.samples(), &[0.5, 0.5, -0.5]);
    }

    #[test]
    fn test_decode_16_bit() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[[0.5, 0.0], [-0.25, 0.0]]);
        let buffer = decode_wav(&bytes, SoundId::Bird).unwrap();
        assert_relative_eq!(buffer.samples()[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(buffer.samples()[1], -0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_garbage_is_asset_error() {
        let err = decode_wav(b"not a wav file", SoundId::Water).unwrap_err();
        assert_eq!(err.error_code(), "ASSET_DECODE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_write_then_decode_24_bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 / 480.0) - 0.5).collect();

        write_wav(&path, &samples, 48000, 24).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let buffer = decode_wav(&bytes, SoundId::Rain).unwrap();

        assert_eq!(buffer.len(), samples.len());
        for (a, b) in samples.iter().zip(buffer.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_write_rejects_odd_bit_depth() {
        let dir = tempdir().unwrap();
        let err = write_wav(&dir.path().join("x.wav"), &[0.0], 48000, 12).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_load_all_reports_each_failure() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let source = MemoryAssets::new()
            .with_file("wind.wav", wav_bytes(spec, &[[0.1, 0.0]; 64]))
            .with_file("water.wav", b"broken".to_vec());

        let mut bank = AssetBank::new();
        let report = load_all(&source, &mut bank).await;

        assert_eq!(report.loaded, vec![SoundId::Wind]);
        assert_eq!(report.failed.len(), 5);
        assert!(report.fallback_sounds().contains(&SoundId::Water));
        assert!(bank.contains(SoundId::Wind));
        assert!(!bank.contains(SoundId::Water));
    }

    #[tokio::test]
    async fn test_directory_assets() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("rain.wav"), &[0.0, 0.1, 0.2], 44100, 16).unwrap();

        let source = DirectoryAssets::new(dir.path());
        let mut bank = AssetBank::new();
        let report = load_all(&source, &mut bank).await;

        assert_eq!(report.loaded, vec![SoundId::Rain]);
        assert_eq!(bank.get(SoundId::Rain).unwrap().sample_rate(), 44100);
    }
}
