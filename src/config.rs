//! Engine configuration
//!
//! Only ambient settings live here (output rate, master volume, RNG seed,
//! asset location). Pitch-mapping and ducking constants are fixed in code.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AmbienceError, Result};

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default master output gain
pub const DEFAULT_MASTER_GAIN: f32 = 0.8;

/// Runtime configuration for an [`AmbientEngine`](crate::engine::AmbientEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate requested from the backend
    pub sample_rate: u32,
    /// Linear gain applied to the master bus (0.0 to 1.0)
    pub master_gain: f32,
    /// Seed for the sequencer and noise generators; random when absent
    pub seed: Option<u64>,
    /// Directory holding the six sound assets
    pub asset_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            master_gain: DEFAULT_MASTER_GAIN,
            seed: None,
            asset_dir: None,
        }
    }
}

impl EngineConfig {
    /// Create a config with a fixed seed, useful for reproducible renders
    pub fn seeded(seed: u64) -> Self {
        EngineConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Load a config from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config as pretty JSON
    pub fn save_json_file(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192_000 {
            return Err(AmbienceError::InvalidConfig {
                reason: format!("sample rate {} outside 8000..=192000", self.sample_rate),
            });
        }
        if !(0.0..=1.0).contains(&self.master_gain) {
            return Err(AmbienceError::InvalidConfig {
                reason: format!("master gain {} outside 0.0..=1.0", self.master_gain),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 48000);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "seed": 7 }"#).unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::seeded(42);
        config.asset_dir = Some(PathBuf::from("sounds"));
        config.save_json_file(&path).unwrap();

        assert_eq!(EngineConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.master_gain = 1.5;
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
