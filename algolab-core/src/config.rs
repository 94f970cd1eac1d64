//! Configuration for the platform core.
//!
//! Uses `figment` for layered configuration: defaults -> TOML file ->
//! environment. Environment variables are prefixed with `ALGOLAB_` and use
//! `__` as the section separator, e.g. `ALGOLAB_EXECUTION__TIME_LIMIT_SECS=10`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Top-level configuration for the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub content: ContentConfig,
    pub data: DataConfig,
    pub execution: ExecutionConfig,
}

/// Where algorithm documents live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    pub dir: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/algorithms"),
        }
    }
}

/// Where persisted learning-path data lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

/// Snippet execution limits, mapped onto the sandbox by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Default wall-clock limit per snippet, in seconds.
    pub time_limit_secs: u64,
    /// Interpreter step budget per snippet.
    pub max_fuel: u64,
    /// Captured stdout cap in bytes.
    pub max_output_bytes: usize,
    /// Largest array a snippet builtin may allocate.
    pub max_array_len: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 30,
            max_fuel: 50_000_000,
            max_output_bytes: 256 * 1024,
            max_array_len: 1_000_000,
        }
    }
}

impl PlatformConfig {
    /// Load configuration, optionally merging a TOML file over the
    /// defaults, with `ALGOLAB_*` environment variables on top.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("ALGOLAB_").split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}
