//! Engine configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. an optional TOML file (`EngineConfig::from_path`),
//! 3. environment variables (`EngineConfig::with_env_overrides`).
//!
//! ```toml
//! cache_limit = 4
//! foreign_cache_limit = 2
//! trace_dispatch = false
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default number of specializations per call site
pub const DEFAULT_CACHE_LIMIT: usize = 2;

/// Default number of compiled units per foreign evaluation site
pub const DEFAULT_FOREIGN_CACHE_LIMIT: usize = 2;

/// Overrides `cache_limit`
pub const CACHE_LIMIT_ENV: &str = "BITCODE_INTRINSICS_CACHE_LIMIT";

/// Overrides `foreign_cache_limit`
pub const FOREIGN_CACHE_LIMIT_ENV: &str = "BITCODE_INTRINSICS_FOREIGN_CACHE_LIMIT";

/// When set (any value), every call site traces its dispatch decisions to stderr
/// in debug builds
pub const DISPATCH_DEBUG_ENV: &str = "BITCODE_INTRINSICS_DISPATCH_DEBUG";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(String),

    #[error("I/O error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("{field} must be at least 1")]
    InvalidLimit { field: &'static str },

    #[error("invalid value {value:?} for {key}: expected a positive integer")]
    InvalidEnv { key: &'static str, value: String },
}

/// Dispatch engine settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum specializations per intrinsic call site before it goes generic
    pub cache_limit: usize,
    /// Maximum cached compiled units per foreign evaluation entry point
    pub foreign_cache_limit: usize,
    /// Trace every dispatch decision to stderr (debug builds only)
    pub trace_dispatch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_limit: DEFAULT_CACHE_LIMIT,
            foreign_cache_limit: DEFAULT_FOREIGN_CACHE_LIMIT,
            trace_dispatch: false,
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()
    }

    /// Read and parse a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `BITCODE_INTRINSICS_*` environment variables on top of `self`
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(CACHE_LIMIT_ENV) {
            self.cache_limit = parse_limit(CACHE_LIMIT_ENV, &value)?;
        }
        if let Some(value) = lookup(FOREIGN_CACHE_LIMIT_ENV) {
            self.foreign_cache_limit = parse_limit(FOREIGN_CACHE_LIMIT_ENV, &value)?;
        }
        if lookup(DISPATCH_DEBUG_ENV).is_some() {
            self.trace_dispatch = true;
        }
        self.validate()
    }

    /// Reject limits that would make every call site generic from the start
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.cache_limit == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "cache_limit",
            });
        }
        if self.foreign_cache_limit == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "foreign_cache_limit",
            });
        }
        Ok(self)
    }
}

fn parse_limit(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}
