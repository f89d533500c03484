//! Layered application configuration.
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`<config dir>/blockdupe/config.toml` or `--config`)
//! 3. `BLOCKDUPE_*` environment variables (e.g. `BLOCKDUPE_BLOCK_SIZE=4096`)
//! 4. Command-line flags

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, DEFAULT_BLOCK_SIZE, DEFAULT_IO_THREADS};
use crate::error::ConfigError;
use crate::scanner::{DigestAlgorithm, WalkerConfig};

/// Prefix of the environment variables read into the configuration.
pub const ENV_PREFIX: &str = "BLOCKDUPE_";

/// Effective configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes read per file per comparison round.
    pub block_size: usize,
    /// Block digest name.
    pub hash: String,
    /// Minimum file size in bytes.
    pub min_size: u64,
    /// Subdirectory depth (0 = only the given directories).
    pub level: usize,
    /// File extensions to compare; empty compares every file.
    pub masks: Vec<String>,
    /// Directories skipped together with their contents.
    pub exclude: Vec<PathBuf>,
    /// Number of size buckets compared in parallel.
    pub io_threads: usize,
    /// Delete permanently instead of moving to trash.
    pub permanent: bool,
}

impl Default for Config {
    fn default() -> Self {
        let walker = WalkerConfig::default();
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            hash: DigestAlgorithm::default().name().to_string(),
            min_size: walker.min_size,
            level: walker.level,
            masks: Vec::new(),
            exclude: Vec::new(),
            io_threads: DEFAULT_IO_THREADS,
            permanent: false,
        }
    }
}

impl Config {
    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockdupe", "blockdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Defaults, config file and environment, without command-line flags.
    ///
    /// An explicitly given `path` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the explicit file is missing.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::Invalid(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    log::debug!("Looking for config file at {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load the configuration, with `overrides` (usually the parsed CLI
    /// flags) layered on top.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a missing explicit file or a
    /// value of the wrong type in any layer.
    pub fn load<T: Serialize>(path: Option<&Path>, overrides: Option<&T>) -> Result<Self, ConfigError> {
        let mut figment = Self::figment(path)?;
        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }
        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Parse the configured digest name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDigest`] for an unknown name.
    pub fn algorithm(&self) -> Result<DigestAlgorithm, ConfigError> {
        self.hash.parse()
    }

    /// Validate the values and turn them into finder settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown digest, a zero block size or a
    /// zero thread count.
    pub fn finder_config(&self, follow_symlinks: bool) -> Result<FinderConfig, ConfigError> {
        let algorithm = self.algorithm()?;
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidThreadCount);
        }

        let walker_config = WalkerConfig {
            level: self.level,
            exclude: self.exclude.clone(),
            masks: self.masks.clone(),
            min_size: self.min_size,
            follow_symlinks,
        };

        Ok(FinderConfig::default()
            .with_walker_config(walker_config)
            .with_block_size(self.block_size)
            .with_algorithm(algorithm)
            .with_io_threads(self.io_threads))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Write as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        log::info!("Wrote configuration to {}", path.display());
        Ok(())
    }
}
