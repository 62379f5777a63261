#![allow(dead_code)]

use std::sync::Arc;

use pathwatch::cache::{FilePathCache, FilePathCaching};
use pathwatch::fs::mock::MockFileSystem;
use pathwatch::types::{DirectoryPathId, FilePathId, IdPaths, OwnerId, SourceType};
use pathwatch::watch::{FileStatusCache, PathWatcher};
use pathwatch_test_utils::fakes::{FakeDirectoryWatcher, ManualTimer, RecordingNotifier};

pub use pathwatch_test_utils::init_tracing;

pub type TestWatcher = PathWatcher<
    Arc<FilePathCache>,
    FileStatusCache<Arc<FilePathCache>>,
    FakeDirectoryWatcher,
    ManualTimer,
>;

/// A path watcher over an in-memory filesystem with every collaborator
/// faked. The fakes are clones sharing state with the ones moved into the
/// watcher.
pub struct Fixture {
    pub fs: MockFileSystem,
    pub path_cache: Arc<FilePathCache>,
    pub directory_watcher: FakeDirectoryWatcher,
    pub timer: ManualTimer,
    pub notifier: RecordingNotifier,
    pub watcher: TestWatcher,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();

        let fs = MockFileSystem::new();
        let path_cache = Arc::new(FilePathCache::new());
        let directory_watcher = FakeDirectoryWatcher::new();
        let timer = ManualTimer::new();
        let notifier = RecordingNotifier::new();

        let file_status = FileStatusCache::new(Arc::clone(&path_cache), Arc::new(fs.clone()));
        let mut watcher = PathWatcher::new(
            Arc::clone(&path_cache),
            file_status,
            directory_watcher.clone(),
            timer.clone(),
        );
        watcher.set_notifier(Some(Box::new(notifier.clone())));

        Self {
            fs,
            path_cache,
            directory_watcher,
            timer,
            notifier,
            watcher,
        }
    }

    /// Create `path` on the mock filesystem and return its id.
    pub fn file(&self, path: &str) -> FilePathId {
        self.fs.add_file(path, "");
        self.path_cache.file_path_id(path).unwrap()
    }

    pub fn files(&self, paths: &[&str]) -> Vec<FilePathId> {
        paths.iter().map(|path| self.file(path)).collect()
    }

    /// Id of `path` without touching the filesystem.
    pub fn id(&self, path: &str) -> FilePathId {
        self.path_cache.file_path_id(path).unwrap()
    }

    /// Rewrite `path`, advancing its mtime.
    pub fn touch(&self, path: &str) {
        self.fs.add_file(path, "changed");
    }

    pub fn dir(&self, path: &str) -> DirectoryPathId {
        self.path_cache.directory_path_id(path).unwrap()
    }

    /// Declare the complete file set of `owner`, creating missing files.
    pub fn update(&mut self, owner: OwnerId, paths: &[&str]) {
        let ids = paths
            .iter()
            .map(|path| {
                if !pathwatch::fs::FileSystem::exists(&self.fs, std::path::Path::new(path)) {
                    self.fs.add_file(path, "");
                }
                self.id(path)
            })
            .collect();
        self.watcher
            .update_id_paths(&[IdPaths::new(owner, ids)])
            .unwrap();
    }

    /// Report `directories` as changed and fire the compressor timer.
    pub fn flush(&mut self, directories: &[&str]) {
        for directory in directories {
            self.watcher.directory_changed(directory).unwrap();
        }
        self.watcher.compressor_timeout().unwrap();
    }

    /// Files of `owner` currently in the live index, ascending.
    pub fn owner_files(&self, owner: OwnerId) -> Vec<String> {
        let mut files: Vec<String> = self
            .watcher
            .entries()
            .iter()
            .filter(|entry| entry.id == owner)
            .map(|entry| self.path_cache.file_path(entry.file_path_id).unwrap())
            .collect();
        files.sort();
        files
    }
}

pub fn owner(part_id: u32) -> OwnerId {
    OwnerId::new(part_id, SourceType::ProjectInclude)
}
