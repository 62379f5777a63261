//! Recording fakes for the path watcher's collaborators.
//!
//! Each fake shares its log through an `Arc<Mutex<..>>`, so a test keeps a
//! handle to the log while the fake itself is moved into the watcher.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pathwatch::types::{FilePathId, IdPaths};
use pathwatch::watch::{DirectoryWatcher, PathWatcherNotifier, Timer};

/// What a [`FakeDirectoryWatcher`] was asked to do.
#[derive(Debug, Default)]
pub struct WatcherLog {
    /// Every `add_paths` call, in order.
    pub added: Vec<Vec<String>>,
    /// Every `remove_paths` call, in order.
    pub removed: Vec<Vec<String>>,
    /// Currently registered directories.
    pub watched: BTreeSet<String>,
}

/// A `DirectoryWatcher` that only records registrations.
#[derive(Debug, Clone, Default)]
pub struct FakeDirectoryWatcher {
    log: Arc<Mutex<WatcherLog>>,
}

impl FakeDirectoryWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<Mutex<WatcherLog>> {
        Arc::clone(&self.log)
    }

    pub fn watched(&self) -> Vec<String> {
        self.log.lock().unwrap().watched.iter().cloned().collect()
    }

    pub fn add_calls(&self) -> usize {
        self.log.lock().unwrap().added.len()
    }

    pub fn remove_calls(&self) -> usize {
        self.log.lock().unwrap().removed.len()
    }
}

impl DirectoryWatcher for FakeDirectoryWatcher {
    fn add_paths(&mut self, paths: &[String]) {
        let mut log = self.log.lock().unwrap();
        for path in paths {
            assert!(
                log.watched.insert(path.clone()),
                "directory {path} registered twice"
            );
        }
        log.added.push(paths.to_vec());
    }

    fn remove_paths(&mut self, paths: &[String]) {
        let mut log = self.log.lock().unwrap();
        for path in paths {
            assert!(
                log.watched.remove(path),
                "directory {path} removed but never registered"
            );
        }
        log.removed.push(paths.to_vec());
    }
}

/// State of a [`ManualTimer`].
#[derive(Debug, Default)]
pub struct TimerLog {
    pub starts: Vec<Duration>,
    pub stops: usize,
    pub running: bool,
}

/// A `Timer` that never fires on its own; tests fire it by calling the
/// compressor's (or watcher's) timeout directly.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    log: Arc<Mutex<TimerLog>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<Mutex<TimerLog>> {
        Arc::clone(&self.log)
    }

    pub fn is_running(&self) -> bool {
        self.log.lock().unwrap().running
    }

    pub fn start_count(&self) -> usize {
        self.log.lock().unwrap().starts.len()
    }

    /// Generation to tag a timeout event for the latest start with.
    pub fn generation(&self) -> u64 {
        self.start_count() as u64
    }
}

impl Timer for ManualTimer {
    fn start(&mut self, delay: Duration) {
        let mut log = self.log.lock().unwrap();
        log.starts.push(delay);
        log.running = true;
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.stops += 1;
        log.running = false;
    }

    /// The generation of a start is its 1-based position in the log.
    fn is_current(&self, generation: u64) -> bool {
        generation == self.start_count() as u64
    }
}

/// One notifier delivery: both views of the same batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub paths: Vec<FilePathId>,
    pub id_paths: Vec<IdPaths>,
}

/// A `PathWatcherNotifier` that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    paths: Arc<Mutex<Vec<Vec<FilePathId>>>>,
    id_paths: Arc<Mutex<Vec<Vec<IdPaths>>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths_calls(&self) -> Vec<Vec<FilePathId>> {
        self.paths.lock().unwrap().clone()
    }

    pub fn id_paths_calls(&self) -> Vec<Vec<IdPaths>> {
        self.id_paths.lock().unwrap().clone()
    }

    /// Pair up the two calls of every delivery so far.
    pub fn notifications(&self) -> Vec<Notification> {
        let paths = self.paths_calls();
        let id_paths = self.id_paths_calls();
        assert_eq!(
            paths.len(),
            id_paths.len(),
            "paths_changed and paths_with_ids_changed must be called together"
        );
        paths
            .into_iter()
            .zip(id_paths)
            .map(|(paths, id_paths)| Notification { paths, id_paths })
            .collect()
    }

    pub fn clear(&self) {
        self.paths.lock().unwrap().clear();
        self.id_paths.lock().unwrap().clear();
    }
}

impl PathWatcherNotifier for RecordingNotifier {
    fn paths_changed(&mut self, file_path_ids: &[FilePathId]) {
        self.paths.lock().unwrap().push(file_path_ids.to_vec());
    }

    fn paths_with_ids_changed(&mut self, id_paths: &[IdPaths]) {
        self.id_paths.lock().unwrap().push(id_paths.to_vec());
    }
}
