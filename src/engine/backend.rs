//! Output backends
//!
//! The engine never talks to a sound card directly. A backend is opened once
//! by `initialize()`, reports the sample rate it runs at, and may start
//! suspended (browsers and some hosts require a resume after a user gesture).

use log::debug;

use crate::error::{AmbienceError, Result};

/// Something the engine's rendered blocks go to
pub trait AudioBackend: Send {
    /// Open the device, returning the sample rate it will run at
    fn open(&mut self, requested_rate: u32) -> Result<u32>;

    /// Resume a suspended device
    fn resume(&mut self) -> Result<()>;

    fn is_suspended(&self) -> bool;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Always-available backend for offline rendering and tests
///
/// Output is pulled by the host through `AmbientEngine::render`.
#[derive(Debug, Default)]
pub struct OfflineBackend {
    opened_at: Option<u32>,
    suspended: bool,
    resumes: u32,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that opens suspended, like a device awaiting a user gesture
    pub fn suspended() -> Self {
        OfflineBackend {
            suspended: true,
            ..Default::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    /// Number of times `resume()` actually woke the device
    pub fn resume_count(&self) -> u32 {
        self.resumes
    }
}

impl AudioBackend for OfflineBackend {
    fn open(&mut self, requested_rate: u32) -> Result<u32> {
        if let Some(rate) = self.opened_at {
            return Ok(rate);
        }
        debug!("[BACKEND] Offline backend opened at {} Hz", requested_rate);
        self.opened_at = Some(requested_rate);
        Ok(requested_rate)
    }

    fn resume(&mut self) -> Result<()> {
        if self.opened_at.is_none() {
            return Err(AmbienceError::DeviceUnavailable {
                reason: "resume before open".to_string(),
            });
        }
        if self.suspended {
            self.suspended = false;
            self.resumes += 1;
        }
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

/// Backend that never opens, standing in for a machine without audio output
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableBackend {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableBackend {
    fn default() -> Self {
        Self::new("no output device")
    }
}

impl AudioBackend for UnavailableBackend {
    fn open(&mut self, _requested_rate: u32) -> Result<u32> {
        Err(AmbienceError::DeviceUnavailable {
            reason: self.reason.clone(),
        })
    }

    fn resume(&mut self) -> Result<()> {
        Err(AmbienceError::DeviceUnavailable {
            reason: self.reason.clone(),
        })
    }

    fn is_suspended(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
