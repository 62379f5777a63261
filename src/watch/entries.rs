// src/watch/entries.rs

//! Set algebra over sorted [`WatcherEntry`] slices.
//!
//! Every slice passed in here is sorted by `(directory, file, owner)` and
//! free of duplicates; every function keeps that property for what it
//! returns or mutates. All of them are linear merge-scans.

use std::cmp::Ordering;

use crate::types::{DirectoryPathId, FilePathId, IdPaths, OwnerId, WatcherEntry};

/// Sort and deduplicate freshly built entries.
pub fn sort_entries(entries: &mut Vec<WatcherEntry>) {
    entries.sort();
    entries.dedup();
}

/// Entries of `left` that are not in `right`.
pub fn set_difference(left: &[WatcherEntry], right: &[WatcherEntry]) -> Vec<WatcherEntry> {
    let mut difference = Vec::new();
    let mut j = 0;

    for entry in left {
        while j < right.len() && right[j] < *entry {
            j += 1;
        }
        if j >= right.len() || right[j] != *entry {
            difference.push(*entry);
        }
    }

    difference
}

/// Entries in `watched` that an owner listed in `ids` no longer wants,
/// given the owners' complete new entry set `new`.
///
/// `ids` must be sorted.
pub fn not_anymore_watched_entries_with_ids(
    watched: &[WatcherEntry],
    new: &[WatcherEntry],
    ids: &[OwnerId],
) -> Vec<WatcherEntry> {
    let mut old = set_difference(watched, new);
    old.retain(|entry| ids.binary_search(&entry.id).is_ok());
    old
}

/// Merge `new` (disjoint from `watched`) into `watched`.
pub fn merge_entries(watched: &mut Vec<WatcherEntry>, new: Vec<WatcherEntry>) {
    if new.is_empty() {
        return;
    }

    let old = std::mem::take(watched);
    let mut merged = Vec::with_capacity(old.len() + new.len());
    let mut old = old.into_iter().peekable();

    for entry in new {
        while let Some(existing) = old.next_if(|existing| *existing < entry) {
            merged.push(existing);
        }
        merged.push(entry);
    }
    merged.extend(old);

    *watched = merged;
}

/// Remove every entry of `old` from `watched`.
pub fn remove_entries(watched: &mut Vec<WatcherEntry>, old: &[WatcherEntry]) {
    if old.is_empty() {
        return;
    }

    let mut j = 0;
    watched.retain(|entry| {
        while j < old.len() && old[j] < *entry {
            j += 1;
        }
        !(j < old.len() && old[j] == *entry)
    });
}

/// Move every entry owned by one of `ids` out of `watched`.
///
/// `ids` must be sorted. Both the remaining and the returned entries stay
/// sorted.
pub fn remove_owner_entries(watched: &mut Vec<WatcherEntry>, ids: &[OwnerId]) -> Vec<WatcherEntry> {
    let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(watched)
        .into_iter()
        .partition(|entry| ids.binary_search(&entry.id).is_ok());
    *watched = kept;
    removed
}

/// Distinct directories referenced by `entries`, ascending.
pub fn unique_directories(entries: &[WatcherEntry]) -> Vec<DirectoryPathId> {
    let mut directories: Vec<DirectoryPathId> =
        entries.iter().map(|entry| entry.directory_path_id).collect();
    directories.dedup();
    directories
}

/// The subset of `directories` (sorted, unique) that no entry in `watched`
/// references.
pub fn unreferenced_directories(
    directories: Vec<DirectoryPathId>,
    watched: &[WatcherEntry],
) -> Vec<DirectoryPathId> {
    let mut i = 0;
    directories
        .into_iter()
        .filter(|directory| {
            while i < watched.len() && watched[i].directory_path_id < *directory {
                i += 1;
            }
            !(i < watched.len() && watched[i].directory_path_id == *directory)
        })
        .collect()
}

/// Call `f` on every entry of `watched` whose directory is in `directories`
/// (sorted, unique).
pub fn for_each_entry_in_directories<E>(
    watched: &mut [WatcherEntry],
    directories: &[DirectoryPathId],
    mut f: impl FnMut(&mut WatcherEntry) -> Result<(), E>,
) -> Result<(), E> {
    let mut i = 0;
    let mut j = 0;

    while i < watched.len() && j < directories.len() {
        match watched[i].directory_path_id.cmp(&directories[j]) {
            Ordering::Less => {
                // Skip the whole run of smaller directories at once.
                let target = directories[j];
                i += watched[i..].partition_point(|entry| entry.directory_path_id < target);
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                f(&mut watched[i])?;
                i += 1;
            }
        }
    }

    Ok(())
}

/// Distinct file ids of `entries`, ascending.
pub fn file_path_ids(entries: &[WatcherEntry]) -> Vec<FilePathId> {
    let mut ids: Vec<FilePathId> = entries.iter().map(|entry| entry.file_path_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Group `entries` by owner: one record per owner, owners ascending, each
/// file list ascending and unique.
pub fn id_paths(mut entries: Vec<WatcherEntry>) -> Vec<IdPaths> {
    entries.sort_unstable_by_key(|entry| (entry.id, entry.file_path_id));

    entries
        .chunk_by(|a, b| a.id == b.id)
        .map(|group| {
            let mut file_path_ids: Vec<FilePathId> =
                group.iter().map(|entry| entry.file_path_id).collect();
            file_path_ids.dedup();
            IdPaths::new(group[0].id, file_path_ids)
        })
        .collect()
}
