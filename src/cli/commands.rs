//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use log::{info, warn};

use super::{RenderArgs, ToneArgs};
use crate::config::EngineConfig;
use crate::engine::{write_wav, AmbientEngine};
use crate::error::{AmbienceError, Result};
use crate::session::InteractionSession;
use crate::sound::pitch::clamp_calibration_frequency;
use crate::sound::SoundId;

/// Seconds kept at the end of a render for fade-outs
const RELEASE_TAIL_SECS: f64 = 2.0;

/// Frequency update interval of the tone sweep
const SWEEP_STEP_SECS: f64 = 0.02;

/// Render a scripted session to WAV.
pub async fn render(args: &RenderArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(dir) = &args.assets {
        config.asset_dir = Some(dir.clone());
    }
    config.validate()?;
    if args.duration <= 0.0 {
        return Err(AmbienceError::InvalidConfig {
            reason: format!("duration {} must be positive", args.duration),
        });
    }

    let mut engine = open_engine(config)?;
    if let Some(report) = engine.load_configured_assets().await {
        for (sound, err) in &report.failed {
            warn!("{} will be synthesized: {}", sound, err);
        }
    }

    engine.start_ambient_bed(args.frequency);
    info!(
        "Rendering {:.1}s at {:.1} Hz",
        args.duration,
        engine.reference_frequency()
    );

    let mut session = InteractionSession::new();
    for sound in &args.sounds {
        session.toggle(&mut engine, *sound);
    }
    engine.toggle_drone(args.drone);
    engine.toggle_piano(args.piano);

    let sample_rate = engine.sample_rate().unwrap_or(engine.config().sample_rate);
    let total = (args.duration * sample_rate as f64) as usize;
    let tail = ((RELEASE_TAIL_SECS * sample_rate as f64) as usize).min(total / 2);
    let mut samples = vec![0.0; total];

    let (body, end) = samples.split_at_mut(total - tail);
    engine.render(body);
    session.stop_all(&mut engine);
    engine.toggle_drone(false);
    engine.toggle_piano(false);
    engine.render(end);

    write_wav(&args.output, &samples, sample_rate, args.bit_depth)?;
    println!(
        "Rendered {:.1}s to {} ({} Hz, {}-bit)",
        args.duration,
        args.output.display(),
        sample_rate,
        args.bit_depth
    );
    Ok(())
}

/// Render a calibration tone sweeping between two frequencies.
pub fn tone(args: &ToneArgs) -> Result<()> {
    if args.duration <= 0.0 {
        return Err(AmbienceError::InvalidConfig {
            reason: format!("duration {} must be positive", args.duration),
        });
    }

    let mut engine = open_engine(EngineConfig::default())?;
    let sample_rate = engine.sample_rate().unwrap_or(engine.config().sample_rate);
    let from = clamp_calibration_frequency(args.from);
    let to = clamp_calibration_frequency(args.to);
    info!("Sweeping {:.1} Hz -> {:.1} Hz over {:.1}s", from, to, args.duration);

    engine.start_calibration_tone(from, args.gain.clamp(0.0, 1.0));

    let step = (SWEEP_STEP_SECS * sample_rate as f64) as usize;
    let sweep_len = (args.duration * sample_rate as f64) as usize;
    let tail_len = (0.7 * sample_rate as f64) as usize;
    let mut samples = vec![0.0; sweep_len + tail_len];

    let (sweep, tail) = samples.split_at_mut(sweep_len);
    for (i, block) in sweep.chunks_mut(step.max(1)).enumerate() {
        let progress = (i * step) as f64 / sweep_len as f64;
        engine.update_calibration_tone(from + (to - from) * progress);
        engine.render(block);
    }
    engine.stop_calibration_tone();
    engine.render(tail);

    write_wav(&args.output, &samples, sample_rate, 16)?;
    println!("Tone sweep written to {}", args.output.display());
    Ok(())
}

/// Print pitch multipliers for a reference frequency.
pub fn map(frequency: f64) -> Result<()> {
    println!("Reference frequency: {:.1} Hz", frequency);
    println!("{:-<44}", "");
    println!("{:<8} {:<12} {:>10}", "Sound", "Mapping", "Multiplier");
    for sound in SoundId::ALL {
        let mapping = sound.policy().mapping;
        println!(
            "{:<8} {:<12} {:>10.4}",
            sound.as_str(),
            format!("{:?}", mapping),
            mapping.multiplier(frequency)
        );
    }
    Ok(())
}

fn open_engine(config: EngineConfig) -> Result<AmbientEngine> {
    let mut engine = AmbientEngine::new(config);
    if !engine.initialize() {
        return Err(AmbienceError::DeviceUnavailable {
            reason: engine
                .device_error()
                .unwrap_or("backend failed to open")
                .to_string(),
        });
    }
    Ok(engine)
}
