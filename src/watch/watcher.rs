// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::engine::RuntimeEvent;
use crate::errors::Result;

/// Handle for the config file watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop watching the config.
pub struct ConfigWatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for ConfigWatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcherHandle").finish()
    }
}

/// Watch the config file and send `RuntimeEvent::ConfigChanged` whenever it
/// is written, created or replaced.
///
/// The parent directory is watched (non-recursively) rather than the file
/// itself, so editors that save by renaming a temp file over the config are
/// still picked up.
pub fn spawn_config_watcher(
    config_path: &Path,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
) -> Result<ConfigWatcherHandle> {
    let config_path = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    let parent = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = config_path.file_name().map(|name| name.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("pathwatch: config watch error: {err}");
                    return;
                }
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_)
            ) {
                return;
            }
            let touches_config = event
                .paths
                .iter()
                .any(|path| path.file_name().map(|n| n.to_os_string()) == file_name);
            if touches_config {
                let _ = runtime_tx.send(RuntimeEvent::ConfigChanged);
            }
        },
        Config::default(),
    )?;

    watcher.watch(&parent, RecursiveMode::NonRecursive)?;
    info!("config watcher started on {:?}", config_path);

    Ok(ConfigWatcherHandle { _inner: watcher })
}
