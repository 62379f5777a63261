// src/config/validate.rs

use std::collections::BTreeMap;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PathWatchError, Result};
use crate::types::OwnerId;

const MAX_DEBOUNCE_MS: u64 = 1000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PathWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.owner))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_owners(cfg)?;
    validate_global_config(cfg)?;
    validate_unique_owner_ids(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn ensure_has_owners(cfg: &RawConfigFile) -> Result<()> {
    if cfg.owner.is_empty() {
        return Err(PathWatchError::ConfigError(
            "config must contain at least one [owner.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let debounce_ms = cfg.config.debounce_ms;
    if debounce_ms == 0 || debounce_ms > MAX_DEBOUNCE_MS {
        return Err(PathWatchError::ConfigError(format!(
            "[config].debounce_ms must be between 1 and {} (got {})",
            MAX_DEBOUNCE_MS, debounce_ms
        )));
    }
    Ok(())
}

fn validate_unique_owner_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: BTreeMap<OwnerId, &str> = BTreeMap::new();
    for (name, owner) in cfg.owner.iter() {
        if let Some(previous) = seen.insert(owner.owner_id(), name) {
            return Err(PathWatchError::ConfigError(format!(
                "owners '{}' and '{}' share part_id {} and source_type {}",
                previous, name, owner.part_id, owner.source_type
            )));
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg.default.exclude.iter() {
        if pattern.trim().is_empty() {
            return Err(PathWatchError::ConfigError(
                "[default].exclude contains an empty pattern".to_string(),
            ));
        }
        Glob::new(pattern)?;
    }

    for (name, owner) in cfg.owner.iter() {
        let excludes = owner.exclude.iter().flatten();
        for pattern in owner.files.iter().chain(excludes) {
            if pattern.trim().is_empty() {
                return Err(PathWatchError::ConfigError(format!(
                    "owner '{}' contains an empty pattern",
                    name
                )));
            }
            Glob::new(pattern)?;
        }
    }
    Ok(())
}
