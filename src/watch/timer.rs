// src/watch/timer.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::RuntimeEvent;
use crate::watch::compressor::Timer;

/// [`Timer`] backed by a Tokio task that posts
/// [`RuntimeEvent::CompressorTimeout`] into the runtime channel.
///
/// Every `start` bumps a generation counter and the posted event carries
/// it. A timeout already queued when the timer was restarted is then
/// recognized as stale through [`Timer::is_current`].
///
/// Must be started from within a Tokio runtime.
#[derive(Debug)]
pub struct TokioTimer {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TokioTimer {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            handle: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Timer for TokioTimer {
    fn start(&mut self, delay: Duration) {
        self.stop();
        self.generation = self.generation.wrapping_add(1);

        let tx = self.runtime_tx.clone();
        let generation = self.generation;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The runtime may already be gone during shutdown.
            let _ = tx.send(RuntimeEvent::CompressorTimeout(generation));
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
