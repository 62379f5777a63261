// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{CacheStorageMode, OwnerId, SourceType};

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [config]
/// debounce_ms = 20
/// cache_storage = "file"
///
/// [default]
/// exclude = ["**/*.tmp"]
///
/// [owner.core]
/// part_id = 1
/// source_type = "project_include"
/// files = ["include/**/*.h"]
/// ```
///
/// All sections are optional at the TOML level; validation requires at
/// least one owner.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Defaults from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All owners from `[owner.<name>]`, keyed by owner name.
    #[serde(default)]
    pub owner: BTreeMap<String, OwnerConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    owner: BTreeMap<String, OwnerConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        owner: BTreeMap<String, OwnerConfig>,
    ) -> Self {
        Self {
            config,
            default,
            owner,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn owners(&self) -> &BTreeMap<String, OwnerConfig> {
        &self.owner
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiescence window of the change compressor, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Where the path tables are kept between runs.
    #[serde(default)]
    pub cache_storage: CacheStorageMode,
}

fn default_debounce_ms() -> u64 {
    20
}

impl ConfigSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            cache_storage: CacheStorageMode::default(),
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Exclude patterns applied to owners that do not override them.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[owner.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerConfig {
    pub part_id: u32,

    #[serde(default)]
    pub source_type: SourceType,

    /// Glob patterns, relative to the config root, selecting the files this
    /// owner cares about.
    #[serde(default)]
    pub files: Vec<String>,

    /// Optional owner-local exclude patterns.
    ///
    /// If `None`, the owner uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, `default.exclude` is appended to `owner.exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,
}

impl OwnerConfig {
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.part_id, self.source_type)
    }
}
