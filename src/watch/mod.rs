// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling per-owner `files` / `exclude` glob patterns.
//! - Keeping the sorted watcher entry index and the set of OS-watched
//!   directories in sync with what owners declare ([`path_watcher`]).
//! - Debouncing raw directory notifications ([`compressor`]).
//! - Re-statting files so only real modifications are reported
//!   ([`file_status`]).
//!
//! The `notify`-backed pieces ([`directory_watcher`], [`watcher`]) only post
//! `RuntimeEvent`s; all state changes happen on the runtime loop.

pub mod compressor;
pub mod directory_watcher;
pub mod entries;
pub mod file_status;
pub mod notifier;
pub mod path_watcher;
pub mod patterns;
pub mod timer;
pub mod watcher;

pub use compressor::{ChangeCompressor, CompressorCallback, Timer, DEFAULT_DEBOUNCE};
pub use directory_watcher::{DirectoryWatcher, NotifyDirectoryWatcher};
pub use file_status::{FileStatus, FileStatusCache};
pub use notifier::{LoggingNotifier, PathWatcherNotifier};
pub use path_watcher::PathWatcher;
pub use patterns::{
    build_profiles_from_config, collect_matching_files, resolve_id_paths, OwnerWatchProfile,
};
pub use timer::TokioTimer;
pub use watcher::{spawn_config_watcher, ConfigWatcherHandle};
