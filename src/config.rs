//! Configuration for ChunkKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a ChunkKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory that holds one sub-directory per named store
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {name}/
    ///           ├── index.json        (chunk catalog + auto-key counter)
    ///           └── {chunk_id}.json   (one file per chunk)
    pub data_dir: PathBuf,

    /// Logical store name (also the sub-directory name)
    pub name: String,

    /// Maximum number of keys a single chunk may hold
    pub max_chunk_size: usize,

    // -------------------------------------------------------------------------
    // Chunk ID Configuration
    // -------------------------------------------------------------------------
    /// Snowflake epoch in unix millis (None = Twitter epoch)
    pub epoch: Option<u64>,

    // -------------------------------------------------------------------------
    // Startup Configuration
    // -------------------------------------------------------------------------
    /// Run a synchronize pass during `init`
    pub synchronize_on_init: bool,

    /// File that must exist before the store may be initialized
    pub required_marker: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Retry policy applied to every file operation
    pub retry: RetryPolicy,
}

/// Bounded retry-with-delay applied to individual file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts (milliseconds)
    pub delay_ms: u64,

    /// Number of retries after the first failure
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// A policy that fails on the first error (useful in tests)
    pub fn none() -> Self {
        Self {
            delay_ms: 0,
            attempts: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            name: "default".to_string(),
            max_chunk_size: 100,
            epoch: None,
            synchronize_on_init: false,
            required_marker: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory holding this store's index and chunk files
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(&self.name)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all stores)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the store name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the maximum number of keys per chunk
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.max_chunk_size = size;
        self
    }

    /// Set the snowflake epoch (unix millis)
    pub fn epoch(mut self, epoch: u64) -> Self {
        self.config.epoch = Some(epoch);
        self
    }

    /// Run `synchronize` as part of `init`
    pub fn synchronize_on_init(mut self, enabled: bool) -> Self {
        self.config.synchronize_on_init = enabled;
        self
    }

    /// Require a marker file to exist before `init` succeeds
    pub fn required_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.required_marker = Some(path.into());
        self
    }

    /// Set the file operation retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
