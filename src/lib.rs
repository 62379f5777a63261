// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{
    FilePathCache, FilePathCaching, FilePathTableStore, MemoryPathTableStore, PathTableStore,
};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeContext, RuntimeEvent};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::CacheStorageMode;
use crate::watch::compressor::ChangeCompressor;
use crate::watch::directory_watcher::NotifyDirectoryWatcher;
use crate::watch::file_status::FileStatusCache;
use crate::watch::notifier::LoggingNotifier;
use crate::watch::path_watcher::PathWatcher;
use crate::watch::patterns::{build_profiles_from_config, resolve_id_paths};
use crate::watch::timer::TokioTimer;
use crate::watch::watcher::spawn_config_watcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the path cache and its warm start from the path table store
/// - the OS directory watcher, compressor timer and notifier
/// - the config file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let root = fs.canonicalize(&config_root_dir(&config_path))?;

    let path_cache = Arc::new(FilePathCache::new());
    let store = path_table_store(&cfg, &root, &fs);
    warm_start(&path_cache, store.as_ref());

    if args.dry_run {
        print_dry_run(&cfg, fs.as_ref(), &root, &path_cache)?;
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let directory_watcher = NotifyDirectoryWatcher::new(rt_tx.clone())?;
    let debounce_override = args.debounce_ms.map(Duration::from_millis);
    let compressor = ChangeCompressor::with_delay(
        TokioTimer::new(rt_tx.clone()),
        debounce_override.unwrap_or_else(|| cfg.config().debounce()),
    );
    let file_status = FileStatusCache::new(Arc::clone(&path_cache), Arc::clone(&fs));

    let mut path_watcher = PathWatcher::with_compressor(
        Arc::clone(&path_cache),
        file_status,
        directory_watcher,
        compressor,
    );
    path_watcher.set_notifier(Some(Box::new(LoggingNotifier::new(Arc::clone(&path_cache)))));

    let _config_watcher = spawn_config_watcher(&config_path, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }

    let context = RuntimeContext {
        path_cache,
        fs,
        root,
        config_path,
        store,
        debounce_override,
    };
    let mut runtime = Runtime::new(path_watcher, context, rt_rx);
    runtime.apply_config(&cfg)?;

    runtime.run().await?;
    Ok(())
}

/// Figure out the project root owner patterns are relative to.
///
/// - If the config path has a non-empty parent (e.g. "configs/Pathwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Pathwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn path_table_store(
    cfg: &ConfigFile,
    root: &Path,
    fs: &Arc<dyn FileSystem>,
) -> Box<dyn PathTableStore> {
    match cfg.config().cache_storage {
        CacheStorageMode::File => {
            Box::new(FilePathTableStore::new(root.to_path_buf(), Arc::clone(fs)))
        }
        CacheStorageMode::Memory => Box::new(MemoryPathTableStore::new()),
    }
}

/// Seed the path cache from the store. Unreadable or corrupt tables are
/// discarded and the cache starts empty.
pub fn warm_start(path_cache: &FilePathCache, store: &dyn PathTableStore) {
    let tables = match store.load() {
        Ok(Some(tables)) => tables,
        Ok(None) => return,
        Err(err) => {
            warn!(error = %err, "discarding unreadable path tables");
            return;
        }
    };

    match path_cache.populate(tables) {
        Ok(()) => info!(
            directories = path_cache.directory_count(),
            files = path_cache.file_count(),
            "path cache warm-started"
        ),
        Err(err) => warn!(error = %err, "discarding corrupt path tables"),
    }
}

/// Dry-run output: every owner with the files it would watch.
fn print_dry_run(
    cfg: &ConfigFile,
    fs: &dyn FileSystem,
    root: &Path,
    path_cache: &FilePathCache,
) -> Result<()> {
    println!("pathwatch dry-run");
    println!("  root = {}", root.display());
    println!("  config.debounce_ms = {}", cfg.config().debounce_ms);
    println!("  config.cache_storage = {:?}", cfg.config().cache_storage);
    println!();

    let profiles = build_profiles_from_config(cfg)?;
    let id_paths = resolve_id_paths(fs, root, &profiles, &path_cache)?;

    let mut directories = BTreeSet::new();
    println!("owners ({}):", profiles.len());
    for (profile, record) in profiles.iter().zip(id_paths.iter()) {
        println!("  - {} ({})", profile.name(), record.id);
        for &id in record.file_path_ids.iter() {
            println!("      {}", path_cache.file_path(id)?);
            directories.insert(path_cache.directory_path(path_cache.directory_path_id_of(id)?)?);
        }
    }

    println!();
    println!("directories ({}):", directories.len());
    for directory in directories.iter() {
        println!("  - {directory}");
    }

    debug!("dry-run complete (nothing watched)");
    Ok(())
}
