// src/watch/compressor.rs

//! Debouncing of raw "directory changed" notifications.
//!
//! A build or a multi-file save makes the OS report the same directory many
//! times within a few milliseconds. The compressor collects those ids into a
//! sorted, duplicate-free pending set and (re)starts a single-shot
//! [`Timer`] on every addition. When the timer fires, the whole batch is
//! handed over exactly once and the pending set is cleared.
//!
//! The callback is looked up when the timer fires, not when it is started:
//! replacing or clearing it affects a flush that is already scheduled.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::types::DirectoryPathId;

/// Default quiescence window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(20);

/// A restartable single-shot timer.
///
/// Implementations arrange for [`ChangeCompressor::timeout`] (or the owning
/// watcher's equivalent) to be called once the delay elapses without
/// another `start`.
pub trait Timer {
    /// Start the countdown, discarding any countdown already running.
    fn start(&mut self, delay: Duration);

    fn stop(&mut self);

    /// Whether a fire tagged with `generation` belongs to the latest
    /// `start`. Timers that fire synchronously never go stale.
    fn is_current(&self, generation: u64) -> bool {
        let _ = generation;
        true
    }
}

pub type CompressorCallback = Box<dyn FnMut(Vec<DirectoryPathId>)>;

pub struct ChangeCompressor<T> {
    timer: T,
    delay: Duration,
    pending: Vec<DirectoryPathId>,
    callback: Option<CompressorCallback>,
}

impl<T: Timer> ChangeCompressor<T> {
    pub fn new(timer: T) -> Self {
        Self::with_delay(timer, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(timer: T, delay: Duration) -> Self {
        Self {
            timer,
            delay,
            pending: Vec::new(),
            callback: None,
        }
    }

    /// Swap the flush target, returning the previous one.
    pub fn set_callback(&mut self, callback: Option<CompressorCallback>) -> Option<CompressorCallback> {
        std::mem::replace(&mut self.callback, callback)
    }

    pub fn add_directory_path_id(&mut self, id: DirectoryPathId) {
        if let Err(position) = self.pending.binary_search(&id) {
            self.pending.insert(position, id);
        }
        self.timer.start(self.delay);
    }

    /// Take the pending batch without waiting for the timer.
    pub fn take_directory_path_ids(&mut self) -> Vec<DirectoryPathId> {
        std::mem::take(&mut self.pending)
    }

    /// Timer expiry: flush the pending batch to the current callback.
    ///
    /// Without a callback the batch is dropped.
    pub fn timeout(&mut self) {
        self.timer.stop();
        let batch = self.take_directory_path_ids();
        if batch.is_empty() {
            return;
        }

        match self.callback.as_mut() {
            Some(callback) => {
                debug!(directories = batch.len(), "flushing compressed directory changes");
                callback(batch);
            }
            None => {
                debug!(directories = batch.len(), "no compressor callback; dropping batch");
            }
        }
    }

    pub fn pending(&self) -> &[DirectoryPathId] {
        &self.pending
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Takes effect at the next `add_directory_path_id`.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub(crate) fn stop_timer(&mut self) {
        self.timer.stop();
    }
}

impl<T> fmt::Debug for ChangeCompressor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeCompressor")
            .field("delay", &self.delay)
            .field("pending", &self.pending)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}
