// src/watch/path_watcher.rs

//! The path watcher: owners declare which files they care about, the
//! watcher keeps the minimal set of directories watched at the OS level and
//! turns directory change notifications back into per-owner file changes.
//!
//! The live index is a `Vec<WatcherEntry>` kept sorted by
//! `(directory, file, owner)`. A directory is registered with the OS watcher
//! when the first entry references it and unregistered when the last one
//! goes away; there is no separate refcount.
//!
//! Runs on a single event-processing thread; nothing in here locks.

use std::fmt;

use tracing::{debug, info};

use crate::cache::FilePathCaching;
use crate::errors::Result;
use crate::types::{DirectoryPathId, IdPaths, OwnerId, WatcherEntry};
use crate::watch::compressor::{ChangeCompressor, Timer};
use crate::watch::directory_watcher::DirectoryWatcher;
use crate::watch::entries::{
    file_path_ids, for_each_entry_in_directories, id_paths, merge_entries,
    not_anymore_watched_entries_with_ids, remove_entries, remove_owner_entries, set_difference,
    sort_entries, unique_directories, unreferenced_directories,
};
use crate::watch::file_status::FileStatus;
use crate::watch::notifier::PathWatcherNotifier;

pub struct PathWatcher<P, S, W, T> {
    path_cache: P,
    file_status: S,
    watcher: W,
    compressor: ChangeCompressor<T>,
    entries: Vec<WatcherEntry>,
    notifier: Option<Box<dyn PathWatcherNotifier>>,
}

impl<P, S, W, T> PathWatcher<P, S, W, T>
where
    P: FilePathCaching,
    S: FileStatus,
    W: DirectoryWatcher,
    T: Timer,
{
    pub fn new(path_cache: P, file_status: S, watcher: W, timer: T) -> Self {
        Self::with_compressor(path_cache, file_status, watcher, ChangeCompressor::new(timer))
    }

    pub fn with_compressor(
        path_cache: P,
        file_status: S,
        watcher: W,
        compressor: ChangeCompressor<T>,
    ) -> Self {
        Self {
            path_cache,
            file_status,
            watcher,
            compressor,
            entries: Vec::new(),
            notifier: None,
        }
    }

    /// Replace the notifier, returning the previous one. With no notifier,
    /// flushed changes are dropped.
    pub fn set_notifier(
        &mut self,
        notifier: Option<Box<dyn PathWatcherNotifier>>,
    ) -> Option<Box<dyn PathWatcherNotifier>> {
        std::mem::replace(&mut self.notifier, notifier)
    }

    /// Declare, per owner, the complete set of files it cares about.
    ///
    /// Owners not mentioned keep their entries untouched. New entries are
    /// added before stale ones are removed, so a directory that stays
    /// referenced is never unwatched in between.
    pub fn update_id_paths(&mut self, id_paths: &[IdPaths]) -> Result<()> {
        let (entries, ids) = self.entries_and_ids(id_paths)?;

        self.add_entries(&entries)?;
        self.remove_unused_entries(&entries, &ids)?;

        debug!(
            owners = ids.len(),
            entries = self.entries.len(),
            "updated watched id paths"
        );
        Ok(())
    }

    /// Drop every entry owned by one of `ids`.
    pub fn remove_ids(&mut self, ids: &[OwnerId]) -> Result<()> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let removed = remove_owner_entries(&mut self.entries, &ids);
        let unreferenced = unreferenced_directories(unique_directories(&removed), &self.entries);
        self.unwatch_directories(&unreferenced)?;

        info!(
            owners = ids.len(),
            removed = removed.len(),
            "removed owners from path watcher"
        );
        Ok(())
    }

    /// Raw OS notification for `path`; queued into the compressor.
    pub fn directory_changed(&mut self, path: &str) -> Result<()> {
        let id = self.path_cache.directory_path_id(path)?;
        debug!(%path, %id, "directory changed");
        self.compressor.add_directory_path_id(id);
        Ok(())
    }

    /// The compressor's timer fired: resolve and report the pending batch.
    pub fn compressor_timeout(&mut self) -> Result<()> {
        self.compressor.stop_timer();
        let directories = self.compressor.take_directory_path_ids();
        if directories.is_empty() {
            return Ok(());
        }
        self.changed_directories(directories)
    }

    /// Re-stat every watched file in `directories` and notify about the
    /// ones whose modification time advanced.
    pub fn changed_directories(&mut self, mut directories: Vec<DirectoryPathId>) -> Result<()> {
        if self.notifier.is_none() {
            debug!(
                directories = directories.len(),
                "no notifier registered; dropping directory changes"
            );
            return Ok(());
        }

        directories.sort_unstable();
        directories.dedup();

        let changed = self.changed_entries(&directories)?;
        if changed.is_empty() {
            debug!(directories = directories.len(), "no watched file really changed");
            return Ok(());
        }

        let file_ids = file_path_ids(&changed);
        let grouped = id_paths(changed);
        info!(
            files = file_ids.len(),
            owners = grouped.len(),
            "reporting changed files"
        );

        if let Some(notifier) = self.notifier.as_mut() {
            notifier.paths_changed(&file_ids);
            notifier.paths_with_ids_changed(&grouped);
        }
        Ok(())
    }

    /// The live index, sorted by `(directory, file, owner)`.
    pub fn entries(&self) -> &[WatcherEntry] {
        &self.entries
    }

    /// Directories currently registered with the OS watcher, ascending.
    pub fn watched_directories(&self) -> Vec<DirectoryPathId> {
        unique_directories(&self.entries)
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    pub fn compressor(&self) -> &ChangeCompressor<T> {
        &self.compressor
    }

    pub fn compressor_mut(&mut self) -> &mut ChangeCompressor<T> {
        &mut self.compressor
    }

    fn entries_and_ids(&mut self, id_paths: &[IdPaths]) -> Result<(Vec<WatcherEntry>, Vec<OwnerId>)> {
        let mut entries = Vec::with_capacity(id_paths.iter().map(|p| p.file_path_ids.len()).sum());
        let mut ids = Vec::with_capacity(id_paths.len());

        for record in id_paths {
            ids.push(record.id);
            for &file_path_id in record.file_path_ids.iter() {
                let directory_path_id = self.path_cache.directory_path_id_of(file_path_id)?;
                let last_modified = self.file_status.last_modified_time(file_path_id)?;
                entries.push(WatcherEntry::new(
                    record.id,
                    directory_path_id,
                    file_path_id,
                    last_modified,
                ));
            }
        }

        sort_entries(&mut entries);
        ids.sort_unstable();
        ids.dedup();

        Ok((entries, ids))
    }

    fn add_entries(&mut self, entries: &[WatcherEntry]) -> Result<()> {
        let added = set_difference(entries, &self.entries);
        let new_directories = unreferenced_directories(unique_directories(&added), &self.entries);

        merge_entries(&mut self.entries, added);
        self.watch_directories(&new_directories)
    }

    fn remove_unused_entries(&mut self, entries: &[WatcherEntry], ids: &[OwnerId]) -> Result<()> {
        let old = not_anymore_watched_entries_with_ids(&self.entries, entries, ids);
        if old.is_empty() {
            return Ok(());
        }

        remove_entries(&mut self.entries, &old);
        let unreferenced = unreferenced_directories(unique_directories(&old), &self.entries);
        self.unwatch_directories(&unreferenced)
    }

    fn changed_entries(&mut self, directories: &[DirectoryPathId]) -> Result<Vec<WatcherEntry>> {
        let mut changed = Vec::new();
        let file_status = &mut self.file_status;

        for_each_entry_in_directories(&mut self.entries, directories, |entry| -> Result<()> {
            file_status.update(entry.file_path_id)?;
            let current = file_status.last_modified_time(entry.file_path_id)?;
            if entry.last_modified < current {
                entry.last_modified = current;
                changed.push(*entry);
            }
            Ok(())
        })?;

        Ok(changed)
    }

    fn watch_directories(&mut self, directories: &[DirectoryPathId]) -> Result<()> {
        if directories.is_empty() {
            return Ok(());
        }
        let paths = self.directory_paths(directories)?;
        debug!(?paths, "watching directories");
        self.watcher.add_paths(&paths);
        Ok(())
    }

    fn unwatch_directories(&mut self, directories: &[DirectoryPathId]) -> Result<()> {
        if directories.is_empty() {
            return Ok(());
        }
        let paths = self.directory_paths(directories)?;
        debug!(?paths, "unwatching directories");
        self.watcher.remove_paths(&paths);
        Ok(())
    }

    fn directory_paths(&self, directories: &[DirectoryPathId]) -> Result<Vec<String>> {
        directories
            .iter()
            .map(|&id| self.path_cache.directory_path(id))
            .collect()
    }
}

impl<P, S, W, T> fmt::Debug for PathWatcher<P, S, W, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathWatcher")
            .field("entries", &self.entries.len())
            .field("compressor", &self.compressor)
            .field("has_notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}
