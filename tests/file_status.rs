use std::fs::{self, File};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pathwatch::cache::{FilePathCache, FilePathCaching};
use pathwatch::fs::mock::MockFileSystem;
use pathwatch::fs::RealFileSystem;
use pathwatch::types::{FilePathId, MISSING_TIMESTAMP};
use pathwatch::watch::{FileStatus, FileStatusCache};

#[test]
fn real_files_are_stated_and_memoized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.h");
    fs::write(&path, "int a;").unwrap();

    let cache = Arc::new(FilePathCache::new());
    let id = cache.file_path_id(&path.to_string_lossy()).unwrap();
    let mut status = FileStatusCache::new(Arc::clone(&cache), Arc::new(RealFileSystem));

    let first = status.last_modified_time(id).unwrap();
    assert!(first > 0);

    let later = SystemTime::now() + Duration::from_secs(60);
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(later)
        .unwrap();

    // Memoized until explicitly updated.
    assert_eq!(status.last_modified_time(id).unwrap(), first);
    status.update(id).unwrap();
    assert!(status.last_modified_time(id).unwrap() > first);
    assert_eq!(status.len(), 1);
}

#[test]
fn missing_file_reports_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.h");

    let cache = Arc::new(FilePathCache::new());
    let id = cache.file_path_id(&path.to_string_lossy()).unwrap();
    let mut status = FileStatusCache::new(Arc::clone(&cache), Arc::new(RealFileSystem));

    assert_eq!(status.last_modified_time(id).unwrap(), MISSING_TIMESTAMP);

    fs::write(&path, "").unwrap();
    status.update(id).unwrap();
    assert!(status.last_modified_time(id).unwrap() > MISSING_TIMESTAMP);
}

#[test]
fn unknown_id_is_an_error() {
    let cache = Arc::new(FilePathCache::new());
    let mut status = FileStatusCache::new(cache, Arc::new(MockFileSystem::new()));

    assert!(status.last_modified_time(FilePathId(3)).is_err());
    assert!(status.update(FilePathId(3)).is_err());
    assert!(status.is_empty());
}

#[test]
fn mock_clock_advances_on_every_write() {
    let fs = MockFileSystem::new();
    let cache = Arc::new(FilePathCache::new());
    fs.add_file("/p/a.h", "");
    let id = cache.file_path_id("/p/a.h").unwrap();
    let mut status = FileStatusCache::new(Arc::clone(&cache), Arc::new(fs.clone()));

    let before = status.last_modified_time(id).unwrap();
    fs.add_file("/p/a.h", "x");
    status.update(id).unwrap();

    assert!(status.last_modified_time(id).unwrap() > before);
}
