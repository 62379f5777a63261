#![allow(dead_code)]

use std::collections::BTreeMap;

use pathwatch::config::{ConfigFile, ConfigSection, DefaultSection, OwnerConfig, RawConfigFile};
use pathwatch::errors::Result;
use pathwatch::types::{CacheStorageMode, SourceType};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                owner: BTreeMap::new(),
            },
        }
    }

    pub fn with_owner(mut self, name: &str, owner: OwnerConfig) -> Self {
        self.config.owner.insert(name.to_string(), owner);
        self
    }

    pub fn with_default_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn cache_storage(mut self, mode: CacheStorageMode) -> Self {
        self.config.config.cache_storage = mode;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `OwnerConfig`.
pub struct OwnerConfigBuilder {
    owner: OwnerConfig,
}

impl OwnerConfigBuilder {
    pub fn new(part_id: u32) -> Self {
        Self {
            owner: OwnerConfig {
                part_id,
                source_type: SourceType::default(),
                files: vec![],
                exclude: None,
                append_default_exclude: false,
            },
        }
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.owner.source_type = source_type;
        self
    }

    pub fn file(mut self, pattern: &str) -> Self {
        self.owner.files.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        let excludes = self.owner.exclude.get_or_insert(vec![]);
        excludes.push(pattern.to_string());
        self
    }

    pub fn append_default_exclude(mut self, val: bool) -> Self {
        self.owner.append_default_exclude = val;
        self
    }

    pub fn build(self) -> OwnerConfig {
        self.owner
    }
}
