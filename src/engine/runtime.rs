// src/engine/runtime.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{FilePathCache, PathTableStore};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::OwnerId;
use crate::watch::compressor::Timer;
use crate::watch::directory_watcher::DirectoryWatcher;
use crate::watch::file_status::FileStatusCache;
use crate::watch::path_watcher::PathWatcher;
use crate::watch::patterns::{build_profiles_from_config, resolve_id_paths};

use super::RuntimeEvent;

/// The path watcher as the runtime instantiates it.
pub type RuntimePathWatcher<W, T> =
    PathWatcher<Arc<FilePathCache>, FileStatusCache<Arc<FilePathCache>>, W, T>;

/// Everything the runtime needs besides the watcher and the event channel.
pub struct RuntimeContext {
    pub path_cache: Arc<FilePathCache>,
    pub fs: Arc<dyn FileSystem>,
    /// Directory owner file patterns are resolved against.
    pub root: PathBuf,
    /// Re-read on [`RuntimeEvent::ConfigChanged`].
    pub config_path: PathBuf,
    /// Receives the path tables on shutdown.
    pub store: Box<dyn PathTableStore>,
    /// Overrides `[config].debounce_ms` when set.
    pub debounce_override: Option<Duration>,
}

/// Drives the path watcher in response to `RuntimeEvent`s.
pub struct Runtime<W, T> {
    watcher: RuntimePathWatcher<W, T>,
    context: RuntimeContext,
    owners: BTreeSet<OwnerId>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
}

impl<W, T> fmt::Debug for Runtime<W, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("watcher", &self.watcher)
            .field("root", &self.context.root)
            .field("owners", &self.owners)
            .finish_non_exhaustive()
    }
}

impl<W: DirectoryWatcher, T: Timer> Runtime<W, T> {
    pub fn new(
        watcher: RuntimePathWatcher<W, T>,
        context: RuntimeContext,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    ) -> Self {
        Self {
            watcher,
            context,
            owners: BTreeSet::new(),
            event_rx,
        }
    }

    /// Bring the watcher in line with `cfg`.
    ///
    /// Every configured owner gets its complete, freshly resolved file set
    /// first. Owners that disappeared from the config are removed after
    /// that, so a directory that changes hands stays watched throughout.
    pub fn apply_config(&mut self, cfg: &ConfigFile) -> Result<()> {
        let profiles = build_profiles_from_config(cfg)?;
        let owners: BTreeSet<OwnerId> = profiles.iter().map(|p| p.id()).collect();

        let id_paths = resolve_id_paths(
            self.context.fs.as_ref(),
            &self.context.root,
            &profiles,
            &self.context.path_cache,
        )?;
        self.watcher.update_id_paths(&id_paths)?;

        let dropped: Vec<OwnerId> = self.owners.difference(&owners).copied().collect();
        if !dropped.is_empty() {
            self.watcher.remove_ids(&dropped)?;
        }

        let delay = self
            .context
            .debounce_override
            .unwrap_or_else(|| cfg.config().debounce());
        self.watcher.compressor_mut().set_delay(delay);

        info!(
            owners = owners.len(),
            dropped = dropped.len(),
            entries = self.watcher.entries().len(),
            directories = self.watcher.watched_directories().len(),
            "applied config"
        );
        self.owners = owners;
        Ok(())
    }

    /// Handle one event. Returns `false` once the runtime should stop.
    pub fn handle_event(&mut self, event: RuntimeEvent) -> Result<bool> {
        match event {
            RuntimeEvent::DirectoryChanged(path) => {
                self.watcher.directory_changed(&path)?;
            }
            RuntimeEvent::CompressorTimeout(generation) => {
                if self.watcher.compressor().timer().is_current(generation) {
                    self.watcher.compressor_timeout()?;
                } else {
                    debug!(generation, "ignoring timeout from a restarted timer");
                }
            }
            RuntimeEvent::ConfigChanged => {
                self.reload_config();
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Main event loop.
    ///
    /// Runs until shutdown is requested or every sender is gone, then
    /// persists the path tables.
    pub async fn run(mut self) -> Result<()> {
        info!(root = ?self.context.root, "pathwatch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            match self.handle_event(event) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => warn!(error = %err, "failed to handle runtime event"),
            }
        }

        self.persist()?;
        info!("runtime exiting");
        Ok(())
    }

    pub fn watcher(&self) -> &RuntimePathWatcher<W, T> {
        &self.watcher
    }

    pub fn watcher_mut(&mut self) -> &mut RuntimePathWatcher<W, T> {
        &mut self.watcher
    }

    pub fn owners(&self) -> &BTreeSet<OwnerId> {
        &self.owners
    }

    /// Save the current path tables to the configured store.
    pub fn persist(&mut self) -> Result<()> {
        let tables = self.context.path_cache.tables();
        self.context.store.save(&tables)
    }

    /// A broken config keeps the previous one in force.
    fn reload_config(&mut self) {
        let cfg = match load_and_validate(&self.context.config_path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(
                    path = ?self.context.config_path,
                    error = %err,
                    "config reload failed; keeping previous config"
                );
                return;
            }
        };

        info!(path = ?self.context.config_path, "config changed; reloading");
        if let Err(err) = self.apply_config(&cfg) {
            warn!(error = %err, "failed to apply reloaded config");
        }
    }
}
