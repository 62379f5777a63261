// src/cache/file_path_cache.rs

//! Path-to-id cache used by the watcher.
//!
//! Directory paths and file paths live in two separate [`StringCache`]s. A
//! file's directory id is derived from its path on demand, so both tables
//! stay append-only.

use std::sync::Arc;

use crate::cache::lock::{LockKind, Shared};
use crate::cache::string_cache::{ReverseOrder, StringCache, StringCacheEntry};
use crate::errors::Result;
use crate::types::{DirectoryPathId, FilePathId};

/// The lookups the path watcher and file-status probe need.
pub trait FilePathCaching {
    fn file_path_id(&self, path: &str) -> Result<FilePathId>;

    fn file_path(&self, id: FilePathId) -> Result<String>;

    fn directory_path_id(&self, path: &str) -> Result<DirectoryPathId>;

    fn directory_path(&self, id: DirectoryPathId) -> Result<String>;

    /// Id of the directory that contains `file`.
    fn directory_path_id_of(&self, file: FilePathId) -> Result<DirectoryPathId>;
}

impl<C: FilePathCaching + ?Sized> FilePathCaching for &C {
    fn file_path_id(&self, path: &str) -> Result<FilePathId> {
        (**self).file_path_id(path)
    }

    fn file_path(&self, id: FilePathId) -> Result<String> {
        (**self).file_path(id)
    }

    fn directory_path_id(&self, path: &str) -> Result<DirectoryPathId> {
        (**self).directory_path_id(path)
    }

    fn directory_path(&self, id: DirectoryPathId) -> Result<String> {
        (**self).directory_path(id)
    }

    fn directory_path_id_of(&self, file: FilePathId) -> Result<DirectoryPathId> {
        (**self).directory_path_id_of(file)
    }
}

impl<C: FilePathCaching + ?Sized> FilePathCaching for Arc<C> {
    fn file_path_id(&self, path: &str) -> Result<FilePathId> {
        (**self).file_path_id(path)
    }

    fn file_path(&self, id: FilePathId) -> Result<String> {
        (**self).file_path(id)
    }

    fn directory_path_id(&self, path: &str) -> Result<DirectoryPathId> {
        (**self).directory_path_id(path)
    }

    fn directory_path(&self, id: DirectoryPathId) -> Result<String> {
        (**self).directory_path(id)
    }

    fn directory_path_id_of(&self, file: FilePathId) -> Result<DirectoryPathId> {
        (**self).directory_path_id_of(file)
    }
}

/// Exported contents of a [`FilePathCache`], used for warm starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTables {
    pub directories: Vec<StringCacheEntry<DirectoryPathId>>,
    pub files: Vec<StringCacheEntry<FilePathId>>,
}

impl PathTables {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug)]
pub struct FilePathCache<K: LockKind = Shared> {
    directories: StringCache<DirectoryPathId, K, ReverseOrder>,
    files: StringCache<FilePathId, K>,
}

impl FilePathCache<Shared> {
    pub fn new() -> Self {
        Self::with_lock()
    }
}

impl<K: LockKind> FilePathCache<K> {
    /// Empty cache guarded by the lock kind `K`.
    pub fn with_lock() -> Self {
        Self {
            directories: StringCache::new(),
            files: StringCache::new(),
        }
    }

    pub fn file_path_ids<I, S>(&self, paths: I) -> Result<Vec<FilePathId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: Vec<String> = paths
            .into_iter()
            .map(|path| normalize_path_str(path.as_ref()))
            .collect();
        self.files.string_ids(normalized)
    }

    /// Replace both tables and validate them. On
    /// [`CacheCorrupt`](crate::errors::PathWatchError::CacheCorrupt) both
    /// tables are left empty.
    pub fn populate(&self, tables: PathTables) -> Result<()> {
        let result = self
            .directories
            .populate(tables.directories)
            .and_then(|()| self.files.populate(tables.files));
        if result.is_err() {
            self.clear();
        }
        result
    }

    pub fn unchecked_populate(&self, tables: PathTables) -> Result<()> {
        let result = self
            .directories
            .unchecked_populate(tables.directories)
            .and_then(|()| self.files.unchecked_populate(tables.files));
        if result.is_err() {
            self.clear();
        }
        result
    }

    pub fn tables(&self) -> PathTables {
        PathTables {
            directories: self.directories.entries(),
            files: self.files.entries(),
        }
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn clear(&self) {
        // An empty table always populates cleanly.
        let _ = self.directories.unchecked_populate(Vec::new());
        let _ = self.files.unchecked_populate(Vec::new());
    }
}

impl<K: LockKind> Default for FilePathCache<K> {
    fn default() -> Self {
        Self::with_lock()
    }
}

impl<K: LockKind> FilePathCaching for FilePathCache<K> {
    fn file_path_id(&self, path: &str) -> Result<FilePathId> {
        self.files.string_id(&normalize_path_str(path))
    }

    fn file_path(&self, id: FilePathId) -> Result<String> {
        self.files.string(id)
    }

    fn directory_path_id(&self, path: &str) -> Result<DirectoryPathId> {
        self.directories.string_id(&normalize_path_str(path))
    }

    fn directory_path(&self, id: DirectoryPathId) -> Result<String> {
        self.directories.string(id)
    }

    fn directory_path_id_of(&self, file: FilePathId) -> Result<DirectoryPathId> {
        let path = self.files.string(file)?;
        self.directories.string_id(directory_of(&path))
    }
}

/// Forward slashes, no trailing slash (except for the root itself).
pub fn normalize_path_str(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory part of a normalized file path.
///
/// `"/a/b/c.h"` -> `"/a/b"`, `"/c.h"` -> `"/"`, `"c.h"` -> `"."`.
pub fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => ".",
    }
}
