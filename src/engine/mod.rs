// src/engine/mod.rs

//! Event loop for pathwatch.
//!
//! Everything that happens asynchronously (OS directory notifications, the
//! compressor's timer, config edits, Ctrl-C) is funnelled into one channel
//! of [`RuntimeEvent`]s. [`Runtime`] owns the path watcher and is the only
//! consumer, so the watcher itself never needs to lock.

/// Events flowing into the runtime from watchers, timers and signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The OS reported activity in a watched directory (normalized path).
    DirectoryChanged(String),
    /// The compressor's quiescence window elapsed. Carries the generation
    /// of the timer start that scheduled it.
    CompressorTimeout(u64),
    /// The config file was written or replaced.
    ConfigChanged,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod runtime;

pub use runtime::{Runtime, RuntimeContext};
