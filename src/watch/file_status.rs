// src/watch/file_status.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cache::FilePathCaching;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{FilePathId, MISSING_TIMESTAMP, Timestamp};

/// File-status probe used by the path watcher.
///
/// Both methods only fail when the id cannot be resolved to a path. A file
/// that cannot be stat'ed reports [`MISSING_TIMESTAMP`].
pub trait FileStatus {
    /// Last known modification time, probing the file if it was never seen.
    fn last_modified_time(&mut self, id: FilePathId) -> Result<Timestamp>;

    /// Forget what was known about `id` and stat it again.
    fn update(&mut self, id: FilePathId) -> Result<()>;
}

/// Memoizing [`FileStatus`] over a [`FileSystem`].
#[derive(Debug)]
pub struct FileStatusCache<P> {
    path_cache: P,
    fs: Arc<dyn FileSystem>,
    statuses: HashMap<FilePathId, Timestamp>,
}

impl<P: FilePathCaching> FileStatusCache<P> {
    pub fn new(path_cache: P, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path_cache,
            fs,
            statuses: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    fn stat(&self, id: FilePathId) -> Result<Timestamp> {
        let path = self.path_cache.file_path(id)?;
        let modified = match self.fs.modified(Path::new(&path)) {
            Ok(modified) => modified,
            Err(err) => {
                debug!(%path, error = %err, "stat failed; treating file as missing");
                MISSING_TIMESTAMP
            }
        };
        Ok(modified)
    }
}

impl<P: FilePathCaching> FileStatus for FileStatusCache<P> {
    fn last_modified_time(&mut self, id: FilePathId) -> Result<Timestamp> {
        if let Some(&modified) = self.statuses.get(&id) {
            return Ok(modified);
        }
        let modified = self.stat(id)?;
        self.statuses.insert(id, modified);
        Ok(modified)
    }

    fn update(&mut self, id: FilePathId) -> Result<()> {
        let modified = self.stat(id)?;
        self.statuses.insert(id, modified);
        Ok(())
    }
}
