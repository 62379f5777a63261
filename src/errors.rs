// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathWatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A populated string table failed validation. The cache that raised
    /// this must be discarded and rebuilt from scratch.
    #[error("String cache is corrupt: {0}")]
    CacheCorrupt(String),

    /// Lookup of an id this cache never issued.
    #[error("Unknown {kind} id: {id}")]
    UnknownId { kind: &'static str, id: usize },

    #[error("String cache has no ids left to assign")]
    CacheExhausted,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PathWatchError>;
