//! Packaging configuration.
//!
//! Defaults live in [`PackConfig::default`]. A YAML (or JSON) file holds a
//! [`PackConfigOverrides`] whose `Some` fields replace the defaults.

use crate::batch::DEFAULT_WORKERS;
use crate::codec::{
    ReadLimits, ReadLimitsOverrides, WriteOptions, DEFAULT_COMPRESSION_LEVEL,
    DEFAULT_LARGE_DOCUMENT_BYTES,
};
use crate::error::ConfigError;
use crate::integrity::DEFAULT_LARGE_MODULE_BYTES;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_COMPRESSION_LEVEL: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    pub compression_level: u8,
    pub validate_structure: bool,
    pub large_document_bytes: u64,
    pub large_module_bytes: u64,
    pub hash_workers: usize,
    pub read_limits: ReadLimits,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            validate_structure: true,
            large_document_bytes: DEFAULT_LARGE_DOCUMENT_BYTES,
            large_module_bytes: DEFAULT_LARGE_MODULE_BYTES,
            hash_workers: DEFAULT_WORKERS,
            read_limits: ReadLimits::default(),
        }
    }
}

/// Config file contents; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfigOverrides {
    pub compression_level: Option<u8>,
    pub validate_structure: Option<bool>,
    pub large_document_bytes: Option<u64>,
    pub large_module_bytes: Option<u64>,
    pub hash_workers: Option<usize>,
    pub read_limits: Option<ReadLimitsOverrides>,
}

impl PackConfigOverrides {
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }
}

impl PackConfig {
    /// Apply overrides onto this config. Only `Some` values override.
    pub fn apply(self, overrides: PackConfigOverrides) -> Self {
        Self {
            compression_level: overrides.compression_level.unwrap_or(self.compression_level),
            validate_structure: overrides
                .validate_structure
                .unwrap_or(self.validate_structure),
            large_document_bytes: overrides
                .large_document_bytes
                .unwrap_or(self.large_document_bytes),
            large_module_bytes: overrides
                .large_module_bytes
                .unwrap_or(self.large_module_bytes),
            hash_workers: overrides.hash_workers.unwrap_or(self.hash_workers),
            read_limits: match overrides.read_limits {
                Some(o) => self.read_limits.apply(o),
                None => self.read_limits,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(ConfigError::Invalid {
                field: "compression_level",
                reason: format!(
                    "{} is out of range 0..={MAX_COMPRESSION_LEVEL}",
                    self.compression_level
                ),
            });
        }
        if self.hash_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "hash_workers",
                reason: "must be at least 1".into(),
            });
        }
        if self.read_limits.max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "read_limits.max_entries",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Defaults, overridden by `path` when given, then validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config");
                Self::default().apply(PackConfigOverrides::load(p)?)
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compression_level: self.compression_level,
            validate_structure: self.validate_structure,
        }
    }
}
