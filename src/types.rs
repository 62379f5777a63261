// src/types.rs

//! Id and value types shared by the caches and the path watcher.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::{PathWatchError, Result};

/// Last-modified time of a file in nanoseconds since the Unix epoch.
///
/// `MISSING_TIMESTAMP` is reported for files that cannot be stat'ed.
pub type Timestamp = i64;

pub const MISSING_TIMESTAMP: Timestamp = -1;

/// Dense ids handed out by a [`StringCache`](crate::cache::StringCache).
///
/// An id is the position of its string in the cache's id table, so ids are
/// small, start at zero and never have gaps.
pub trait CacheId: Copy + Ord + fmt::Debug {
    /// Human readable name used in error messages.
    const KIND: &'static str;

    fn from_index(index: usize) -> Result<Self>;
    fn index(self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectoryPathId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilePathId(pub u32);

impl CacheId for DirectoryPathId {
    const KIND: &'static str = "directory path";

    fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(DirectoryPathId)
            .map_err(|_| PathWatchError::CacheExhausted)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl CacheId for FilePathId {
    const KIND: &'static str = "file path";

    fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(FilePathId)
            .map_err(|_| PathWatchError::CacheExhausted)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DirectoryPathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl fmt::Display for FilePathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Opaque id of a project part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct ProjectPartId(pub u32);

/// Which kind of files a project part registered.
///
/// The declaration order is the sort order used for [`OwnerId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    TopProjectInclude,
    ProjectInclude,
    UserInclude,
    SystemInclude,
    TopSystemInclude,
    Source,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::TopProjectInclude => "top_project_include",
            SourceType::ProjectInclude => "project_include",
            SourceType::UserInclude => "user_include",
            SourceType::SystemInclude => "system_include",
            SourceType::TopSystemInclude => "top_system_include",
            SourceType::Source => "source",
        }
    }
}

impl Default for SourceType {
    fn default() -> Self {
        SourceType::Source
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top_project_include" => Ok(SourceType::TopProjectInclude),
            "project_include" => Ok(SourceType::ProjectInclude),
            "user_include" => Ok(SourceType::UserInclude),
            "system_include" => Ok(SourceType::SystemInclude),
            "top_system_include" => Ok(SourceType::TopSystemInclude),
            "source" => Ok(SourceType::Source),
            other => Err(format!("invalid source_type: {other}")),
        }
    }
}

/// Who cares about a set of files: a project part plus the kind of files.
///
/// Ordered by `(part_id, source_type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId {
    pub part_id: ProjectPartId,
    pub source_type: SourceType,
}

impl OwnerId {
    pub fn new(part_id: u32, source_type: SourceType) -> Self {
        Self {
            part_id: ProjectPartId(part_id),
            source_type,
        }
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.part_id.0, self.source_type)
    }
}

/// The complete set of files one owner currently cares about.
///
/// Input unit of `update_id_paths` and output unit of the owner-grouped
/// change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPaths {
    pub id: OwnerId,
    pub file_path_ids: Vec<FilePathId>,
}

impl IdPaths {
    pub fn new(id: OwnerId, file_path_ids: Vec<FilePathId>) -> Self {
        Self { id, file_path_ids }
    }
}

/// One row of the live watch index.
///
/// Equality and ordering only look at `(directory_path_id, file_path_id, id)`;
/// `last_modified` is payload that gets refreshed in place.
#[derive(Debug, Clone, Copy)]
pub struct WatcherEntry {
    pub id: OwnerId,
    pub directory_path_id: DirectoryPathId,
    pub file_path_id: FilePathId,
    pub last_modified: Timestamp,
}

impl WatcherEntry {
    pub fn new(
        id: OwnerId,
        directory_path_id: DirectoryPathId,
        file_path_id: FilePathId,
        last_modified: Timestamp,
    ) -> Self {
        Self {
            id,
            directory_path_id,
            file_path_id,
            last_modified,
        }
    }

    pub fn key(&self) -> (DirectoryPathId, FilePathId, OwnerId) {
        (self.directory_path_id, self.file_path_id, self.id)
    }
}

impl PartialEq for WatcherEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for WatcherEntry {}

impl PartialOrd for WatcherEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WatcherEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

/// Where the path tables are kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStorageMode {
    /// Store the tables in a file (`.pathwatch/paths`).
    File,
    /// Keep the tables in memory only (lost on restart).
    Memory,
}

impl Default for CacheStorageMode {
    fn default() -> Self {
        CacheStorageMode::Memory
    }
}
