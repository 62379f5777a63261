// src/cache/store.rs

//! Persistence of the path tables between runs.
//!
//! The file format is a header line followed by one row per string:
//!
//! ```text
//! pathwatch-paths v1 <blake3 hex of everything after the header line>
//! d<TAB>0<TAB>/home/me/project/include
//! f<TAB>0<TAB>/home/me/project/include/a.h
//! ```
//!
//! A checksum mismatch or a malformed row is reported as
//! [`PathWatchError::CacheCorrupt`]. Paths containing a newline cannot be
//! stored and are skipped on save.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::file_path_cache::PathTables;
use crate::cache::string_cache::StringCacheEntry;
use crate::errors::{PathWatchError, Result};
use crate::fs::FileSystem;
use crate::types::{CacheId, DirectoryPathId, FilePathId};

/// Relative path (from the config root) to the path table file.
pub const PATH_TABLE_FILE: &str = ".pathwatch/paths";

const HEADER_TAG: &str = "pathwatch-paths v1";

/// Abstract storage for exported path tables.
pub trait PathTableStore: Send + Sync {
    /// `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<PathTables>>;
    fn save(&mut self, tables: &PathTables) -> Result<()>;
}

/// Stores the tables in `<root>/.pathwatch/paths`.
pub struct FilePathTableStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FilePathTableStore {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { root, fs }
    }

    pub fn file_path(&self) -> PathBuf {
        self.root.join(PATH_TABLE_FILE)
    }
}

impl PathTableStore for FilePathTableStore {
    fn load(&self) -> Result<Option<PathTables>> {
        let path = self.file_path();
        if !self.fs.exists(&path) {
            debug!(?path, "no stored path tables");
            return Ok(None);
        }

        let contents = self.fs.read_to_string(&path)?;
        let tables = decode_tables(&contents)?;
        info!(
            ?path,
            directories = tables.directories.len(),
            files = tables.files.len(),
            "loaded path tables (file)"
        );
        Ok(Some(tables))
    }

    fn save(&mut self, tables: &PathTables) -> Result<()> {
        let path = self.file_path();
        self.fs.write(&path, encode_tables(tables).as_bytes())?;
        info!(
            ?path,
            directories = tables.directories.len(),
            files = tables.files.len(),
            "stored path tables (file)"
        );
        Ok(())
    }
}

/// Keeps the tables in memory only.
#[derive(Debug, Default)]
pub struct MemoryPathTableStore {
    tables: Option<PathTables>,
}

impl MemoryPathTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathTableStore for MemoryPathTableStore {
    fn load(&self) -> Result<Option<PathTables>> {
        Ok(self.tables.clone())
    }

    fn save(&mut self, tables: &PathTables) -> Result<()> {
        self.tables = Some(tables.clone());
        debug!("stored path tables (memory)");
        Ok(())
    }
}

pub fn encode_tables(tables: &PathTables) -> String {
    let mut body = String::new();
    push_rows(&mut body, 'd', &tables.directories);
    push_rows(&mut body, 'f', &tables.files);

    let checksum = blake3::hash(body.as_bytes()).to_hex();
    format!("{HEADER_TAG} {checksum}\n{body}")
}

fn push_rows<Id: CacheId>(body: &mut String, tag: char, rows: &[StringCacheEntry<Id>]) {
    for row in rows {
        if row.string.contains('\n') {
            warn!(path = ?row.string, "skipping path containing a newline");
            continue;
        }
        body.push(tag);
        body.push('\t');
        body.push_str(&row.id.index().to_string());
        body.push('\t');
        body.push_str(&row.string);
        body.push('\n');
    }
}

pub fn decode_tables(contents: &str) -> Result<PathTables> {
    let (header, body) = contents
        .split_once('\n')
        .ok_or_else(|| corrupt("missing header line"))?;

    let expected = header
        .strip_prefix(HEADER_TAG)
        .map(str::trim)
        .ok_or_else(|| corrupt("unrecognised header"))?;
    let actual = blake3::hash(body.as_bytes()).to_hex();
    if expected != actual.as_str() {
        return Err(corrupt("checksum mismatch"));
    }

    let mut tables = PathTables::default();
    for (number, line) in body.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(tag), Some(id), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(corrupt(&format!("malformed row {}", number + 2)));
        };
        let index: usize = id
            .parse()
            .map_err(|_| corrupt(&format!("bad id {:?} on row {}", id, number + 2)))?;

        match tag {
            "d" => tables
                .directories
                .push(StringCacheEntry::new(path, DirectoryPathId::from_index(index)?)),
            "f" => tables
                .files
                .push(StringCacheEntry::new(path, FilePathId::from_index(index)?)),
            other => {
                return Err(corrupt(&format!("unknown tag {:?} on row {}", other, number + 2)));
            }
        }
    }

    Ok(tables)
}

fn corrupt(reason: &str) -> PathWatchError {
    PathWatchError::CacheCorrupt(format!("path table file: {reason}"))
}
