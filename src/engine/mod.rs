//! Audio Engine Module
//!
//! Core of the ambient engine:
//! - Rendering graph and timer scheduling
//! - Output backends
//! - Asset loading and WAV I/O
//! - The `AmbientEngine` context tying everything together

pub mod backend;
pub mod context;
pub mod graph;
pub mod io;
pub mod scheduler;

pub use backend::{AudioBackend, OfflineBackend, UnavailableBackend};
pub use context::{AmbientEngine, EnginePhase, EngineTimer, RENDER_QUANTUM};
pub use graph::{AudioGraph, EndReason, NodeId, Signal};
pub use io::{
    decode_wav, load_all, write_wav, AssetBank, AssetSource, DirectoryAssets, LoadReport,
    MemoryAssets,
};
pub use scheduler::{Scheduler, TimerId};
