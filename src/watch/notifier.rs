// src/watch/notifier.rs

use tracing::{info, warn};

use crate::cache::FilePathCaching;
use crate::types::{FilePathId, IdPaths};

/// Receiver of the path watcher's change notifications.
///
/// Both calls are made for the same batch, flat view first.
pub trait PathWatcherNotifier {
    /// Every file that really changed, ascending and unique.
    fn paths_changed(&mut self, file_path_ids: &[FilePathId]);

    /// The same changes grouped by owner: one record per owner, owners
    /// ascending, each file list ascending.
    fn paths_with_ids_changed(&mut self, id_paths: &[IdPaths]);
}

/// Notifier used by the binary: prints changed files to stdout.
#[derive(Debug)]
pub struct LoggingNotifier<P> {
    path_cache: P,
}

impl<P: FilePathCaching> LoggingNotifier<P> {
    pub fn new(path_cache: P) -> Self {
        Self { path_cache }
    }

    fn display_path(&self, id: FilePathId) -> String {
        match self.path_cache.file_path(id) {
            Ok(path) => path,
            Err(err) => {
                warn!(%id, error = %err, "changed file id has no path");
                id.to_string()
            }
        }
    }
}

impl<P: FilePathCaching> PathWatcherNotifier for LoggingNotifier<P> {
    fn paths_changed(&mut self, file_path_ids: &[FilePathId]) {
        info!(files = file_path_ids.len(), "watched files changed");
        for &id in file_path_ids {
            println!("[pathwatch] changed: {}", self.display_path(id));
        }
    }

    fn paths_with_ids_changed(&mut self, id_paths: &[IdPaths]) {
        for record in id_paths {
            let paths: Vec<String> = record
                .file_path_ids
                .iter()
                .map(|&id| self.display_path(id))
                .collect();
            println!(
                "[pathwatch] owner {}: {} file(s): {}",
                record.id,
                paths.len(),
                paths.join(", ")
            );
        }
    }
}
