//! Error handling for Ambience
//!
//! Engine operations never surface errors to the UI: asset failures fall back
//! to synthesis and a missing output device turns every call into a no-op.
//! Errors only travel through asset loading reports, configuration loading,
//! backend opening and the CLI.

use thiserror::Error;

use crate::sound::SoundId;

/// Result type alias for Ambience operations
pub type Result<T> = std::result::Result<T, AmbienceError>;

/// Main error type for Ambience operations
#[derive(Error, Debug)]
pub enum AmbienceError {
    // Asset Errors
    #[error("Asset unavailable for {sound}: {reason}")]
    AssetUnavailable { sound: SoundId, reason: String },

    #[error("Failed to decode asset for {sound}: {source}")]
    AssetDecode {
        sound: SoundId,
        #[source]
        source: hound::Error,
    },

    // Device Errors
    #[error("Audio device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    // Usage Errors
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AmbienceError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AmbienceError::AssetUnavailable { .. } => "ASSET_UNAVAILABLE",
            AmbienceError::AssetDecode { .. } => "ASSET_DECODE",
            AmbienceError::DeviceUnavailable { .. } => "DEVICE_UNAVAILABLE",
            AmbienceError::InvalidOperation { .. } => "INVALID_OPERATION",
            AmbienceError::InvalidConfig { .. } => "INVALID_CONFIG",
            AmbienceError::Io(_) => "IO_ERROR",
            AmbienceError::Wav(_) => "WAV_ERROR",
            AmbienceError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the engine degrades gracefully from this error
    ///
    /// Asset failures become synthesized substitutes, a missing device
    /// becomes silence and invalid operations are no-ops.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AmbienceError::AssetUnavailable { .. }
                | AmbienceError::AssetDecode { .. }
                | AmbienceError::DeviceUnavailable { .. }
                | AmbienceError::InvalidOperation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AmbienceError::AssetUnavailable {
            sound: SoundId::Water,
            reason: "404".to_string(),
        };
        assert_eq!(err.error_code(), "ASSET_UNAVAILABLE");
        assert_eq!(err.to_string(), "Asset unavailable for WATER: 404");
    }

    #[test]
    fn test_recoverable_taxonomy() {
        assert!(AmbienceError::DeviceUnavailable {
            reason: "no output".to_string()
        }
        .is_recoverable());
        assert!(AmbienceError::InvalidOperation {
            reason: "already stopped".to_string()
        }
        .is_recoverable());
        assert!(!AmbienceError::InvalidConfig {
            reason: "sample rate".to_string()
        }
        .is_recoverable());
    }
}
