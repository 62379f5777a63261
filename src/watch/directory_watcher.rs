// src/watch/directory_watcher.rs

//! The OS-level directory watch primitive.
//!
//! The path watcher only ever hands directory path lists to
//! [`DirectoryWatcher::add_paths`] / [`DirectoryWatcher::remove_paths`].
//! Change notifications travel the other way as
//! [`RuntimeEvent::DirectoryChanged`] on the runtime channel, one per OS
//! event, duplicates included.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::file_path_cache::normalize_path_str;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

/// Registration side of an OS directory watcher.
///
/// Failures (e.g. a directory that no longer exists) are the
/// implementation's business; callers never retry.
pub trait DirectoryWatcher {
    fn add_paths(&mut self, paths: &[String]);
    fn remove_paths(&mut self, paths: &[String]);
}

/// Non-recursive per-directory watches through `notify`.
pub struct NotifyDirectoryWatcher {
    inner: RecommendedWatcher,
    watched: Arc<Mutex<HashSet<PathBuf>>>,
}

impl std::fmt::Debug for NotifyDirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyDirectoryWatcher").finish_non_exhaustive()
    }
}

impl NotifyDirectoryWatcher {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<Self> {
        let watched: Arc<Mutex<HashSet<PathBuf>>> = Arc::default();

        // Called synchronously on notify's own thread.
        let inner = RecommendedWatcher::new(
            {
                let watched = Arc::clone(&watched);
                move |res: notify::Result<Event>| match res {
                    Ok(event) => forward_event(&event, &watched, &runtime_tx),
                    Err(err) => {
                        eprintln!("pathwatch: directory watch error: {err}");
                    }
                }
            },
            Config::default(),
        )?;

        Ok(Self { inner, watched })
    }
}

impl DirectoryWatcher for NotifyDirectoryWatcher {
    fn add_paths(&mut self, paths: &[String]) {
        for path in paths {
            let path = PathBuf::from(path);
            match self.inner.watch(&path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!(?path, "watching directory");
                    lock(&self.watched).insert(path);
                }
                Err(err) => warn!(?path, error = %err, "failed to watch directory"),
            }
        }
    }

    fn remove_paths(&mut self, paths: &[String]) {
        for path in paths {
            let path = PathBuf::from(path);
            lock(&self.watched).remove(&path);
            if let Err(err) = self.inner.unwatch(&path) {
                warn!(?path, error = %err, "failed to unwatch directory");
            }
        }
    }
}

fn lock(watched: &Mutex<HashSet<PathBuf>>) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
    watched.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}

fn forward_event(
    event: &Event,
    watched: &Mutex<HashSet<PathBuf>>,
    runtime_tx: &mpsc::UnboundedSender<RuntimeEvent>,
) {
    if !is_relevant(&event.kind) {
        return;
    }

    let watched = lock(watched);
    for path in event.paths.iter() {
        let Some(directory) = watched_directory_for(path, &watched) else {
            continue;
        };
        let directory = normalize_path_str(&directory.to_string_lossy());
        if runtime_tx.send(RuntimeEvent::DirectoryChanged(directory)).is_err() {
            // Runtime is gone; nothing left to notify.
            return;
        }
    }
}

/// The watched directory an event path belongs to: the path itself when it
/// is a watched directory, otherwise its parent if that is watched.
fn watched_directory_for<'a>(path: &'a Path, watched: &HashSet<PathBuf>) -> Option<&'a Path> {
    if watched.contains(path) {
        return Some(path);
    }
    path.parent().filter(|parent| watched.contains(*parent))
}
