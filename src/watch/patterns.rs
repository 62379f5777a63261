// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::cache::FilePathCaching;
use crate::cache::file_path_cache::normalize_path_str;
use crate::config::model::ConfigFile;
use crate::fs::FileSystem;
use crate::types::{IdPaths, OwnerId};

/// Directory holding pathwatch's own state; never part of an owner's files.
const STATE_DIR: &str = ".pathwatch";

/// Compiled file/exclude glob patterns for a single owner.
///
/// The patterns are relative to the project root (the directory holding the
/// config file). [`OwnerWatchProfile::matches`] takes paths like
/// `"include/core/types.h"`.
#[derive(Clone)]
pub struct OwnerWatchProfile {
    name: String,
    id: OwnerId,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for OwnerWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerWatchProfile")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl OwnerWatchProfile {
    /// Name of the `[owner.<name>]` section this profile came from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Returns true if this owner is interested in the given path (relative
    /// to project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a compiled profile for every owner in the config.
///
/// Exclude lists follow the default + append rules:
///
/// - If `append_default_exclude = true`, the effective list is
///   `owner.exclude + default.exclude`.
/// - Else, if `owner.exclude` is set, use only that.
/// - Else, use `default.exclude`.
pub fn build_profiles_from_config(cfg: &ConfigFile) -> Result<Vec<OwnerWatchProfile>> {
    let default_exclude = &cfg.default_section().exclude;
    let mut profiles = Vec::with_capacity(cfg.owners().len());

    for (name, owner) in cfg.owners().iter() {
        let exclude_patterns = effective_patterns(
            owner.exclude.as_ref(),
            default_exclude,
            owner.append_default_exclude,
        );

        let watch_set = build_globset(&owner.files)
            .with_context(|| format!("building file globset for owner {name}"))?;

        let exclude_set = if exclude_patterns.is_empty() {
            None
        } else {
            Some(
                build_globset(&exclude_patterns)
                    .with_context(|| format!("building exclude globset for owner {name}"))?,
            )
        };

        profiles.push(OwnerWatchProfile {
            name: name.clone(),
            id: owner.owner_id(),
            watch_set,
            exclude_set,
        });
    }

    Ok(profiles)
}

fn effective_patterns(
    owner_list: Option<&Vec<String>>,
    default_list: &[String],
    append_default: bool,
) -> Vec<String> {
    match (owner_list, append_default) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(default_list.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, _) => default_list.to_vec(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that this owner's patterns select, sorted.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &OwnerWatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                if path.file_name().is_some_and(|name| name == STATE_DIR) {
                    continue;
                }
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if profile.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Resolve every profile against the tree under `root` into the
/// `IdPaths` records the path watcher consumes. Owners matching nothing
/// still get a record, so their old entries are dropped.
pub fn resolve_id_paths<P: FilePathCaching>(
    fs: &dyn FileSystem,
    root: &Path,
    profiles: &[OwnerWatchProfile],
    path_cache: &P,
) -> Result<Vec<IdPaths>> {
    let mut id_paths = Vec::with_capacity(profiles.len());

    for profile in profiles {
        let files = collect_matching_files(fs, root, profile)
            .with_context(|| format!("scanning files for owner {}", profile.name()))?;

        let file_path_ids = files
            .iter()
            .map(|path| path_cache.file_path_id(&normalize_path_str(&path.to_string_lossy())))
            .collect::<crate::errors::Result<Vec<_>>>()?;

        debug!(
            owner = profile.name(),
            id = %profile.id(),
            files = file_path_ids.len(),
            "resolved owner files"
        );
        id_paths.push(IdPaths::new(profile.id(), file_path_ids));
    }

    Ok(id_paths)
}
