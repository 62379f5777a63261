// src/cache/mod.rs

//! String interning for paths.
//!
//! - [`string_cache`]: the generic string <-> dense id cache.
//! - [`lock`]: the locking discipline a cache is instantiated with.
//! - [`file_path_cache`]: directory and file path caches built on top.
//! - [`store`]: persistence of the path tables for warm starts.

pub mod file_path_cache;
pub mod lock;
pub mod store;
pub mod string_cache;

pub use file_path_cache::{FilePathCache, FilePathCaching, PathTables};
pub use lock::{CacheLock, LockKind, Shared, Unshared};
pub use store::{FilePathTableStore, MemoryPathTableStore, PathTableStore, PATH_TABLE_FILE};
pub use string_cache::{
    Lexicographic, ReverseOrder, StringCache, StringCacheEntry, StringOrdering,
};
