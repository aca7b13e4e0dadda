//! Handler Module
//!
//! The chunk handler: the store's public key-value surface.
//!
//! ## Responsibilities
//! - Route keys to the chunk that owns them
//! - Open new chunks when every existing chunk is full
//! - Delete chunk files once their last key is gone
//! - Serialize every operation through a FIFO gate
//! - Repair index/chunk divergence (`synchronize`) and leftover staging
//!   files (startup recovery)

mod gate;
mod recovery;
mod sync;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::chunk::{ChunkData, ChunkDescriptor, ChunkIdGenerator, ChunkStore, IndexStore};
use crate::config::{Config, RetryPolicy};
use crate::error::{ChunkError, Result};

pub use gate::{FifoGate, GateGuard};
pub use recovery::RecoveryReport;
pub use sync::SyncReport;

/// Mutable state reachable only through the gate
struct HandlerState {
    /// Store directory ({data_dir}/{name})
    directory: PathBuf,

    /// Retry policy for chunk handles
    retry: RetryPolicy,

    /// The index file
    index: IndexStore,

    /// Chunk handles created so far, by chunk id
    chunks: HashMap<String, ChunkStore>,

    /// Chunk id source
    ids: ChunkIdGenerator,
}

impl HandlerState {
    /// Handle for chunk `id`, created on first use
    fn chunk(&mut self, id: &str) -> &ChunkStore {
        let (directory, retry) = (&self.directory, self.retry);
        self.chunks
            .entry(id.to_string())
            .or_insert_with(|| ChunkStore::new(directory, id, retry))
    }

    /// Delete chunk `id`'s file (if present) and forget its handle
    fn remove_chunk(&mut self, id: &str) -> Result<()> {
        if self.chunk(id).exists() {
            self.chunk(id).delete()?;
        }
        self.chunks.remove(id);
        Ok(())
    }
}

/// Orchestrates the index and chunk files of one store directory
///
/// ## Concurrency Model: FIFO gate
///
/// Every public operation enters the gate before touching the index and
/// holds it for its entire read-modify-write (or full scan). Callers are
/// admitted in arrival order, so operations from this handler are
/// linearizable. Nothing guards against a second handler or process using
/// the same directory; staged writes only guarantee no file is left torn.
pub struct ChunkHandler {
    /// Handler configuration
    config: Config,

    /// Store directory ({data_dir}/{name})
    directory: PathBuf,

    /// Gate around all mutable state
    state: FifoGate<HandlerState>,
}

impl ChunkHandler {
    /// Create a handler (no I/O; call `init` before use)
    pub fn new(config: Config) -> Self {
        let directory = config.store_dir();
        let state = HandlerState {
            index: IndexStore::new(&directory, &config.name, config.retry),
            directory: directory.clone(),
            retry: config.retry,
            chunks: HashMap::new(),
            ids: ChunkIdGenerator::new(config.epoch),
        };

        Self {
            config,
            directory,
            state: FifoGate::new(state),
        }
    }

    /// Create and initialize a handler
    pub fn open(config: Config) -> Result<Self> {
        let handler = Self::new(config);
        handler.init()?;
        Ok(handler)
    }

    /// Prepare the store directory
    ///
    /// On startup:
    /// 1. Check the required marker file and settings
    /// 2. Create the store directory
    /// 3. Replay or discard leftover staging files
    /// 4. Ensure the index exists
    /// 5. Seed the chunk id generator from the index
    /// 6. Synchronize, if configured
    pub fn init(&self) -> Result<()> {
        // Step 1: Preconditions
        if let Some(marker) = &self.config.required_marker {
            if !marker.exists() {
                return Err(ChunkError::Config(format!(
                    "required file {} was not found; it must exist before the store can be initialized",
                    marker.display()
                )));
            }
        }
        if self.config.max_chunk_size == 0 {
            return Err(ChunkError::Config(
                "max_chunk_size must be at least 1".to_string(),
            ));
        }

        {
            let mut state = self.state.enter();
            if state.ids.epoch_is_future() {
                return Err(ChunkError::Config(format!(
                    "epoch {} is in the future",
                    state.ids.epoch()
                )));
            }

            // Step 2: Store directory
            if !self.directory.exists() {
                fs::create_dir_all(&self.directory)?;
                tracing::debug!("Created store directory {}", self.directory.display());
            }

            // Steps 3 + 4: Recovery (creates the index if missing)
            let report = recovery::recover_staging(&mut state)?;
            if report.replayed > 0 || report.discarded > 0 {
                tracing::warn!(
                    "Staging recovery: {} replayed, {} discarded",
                    report.replayed,
                    report.discarded
                );
            }

            // Step 5: Continue chunk ids above those already on disk
            let index = state.index.fetch()?;
            for descriptor in &index.chunks {
                if let Ok(id) = descriptor.id.parse::<u64>() {
                    state.ids.observe(id);
                }
            }
        }

        tracing::info!(
            store = %self.config.name,
            max_chunk_size = self.config.max_chunk_size,
            "Initialized store at {}",
            self.directory.display()
        );

        // Step 6: Optional repair pass
        if self.config.synchronize_on_init {
            self.synchronize()?;
        }

        Ok(())
    }

    /// Whether any chunk descriptor lists `key`
    pub fn has(&self, key: &str) -> Result<bool> {
        let state = self.state.enter();
        let index = state.index.fetch()?;
        Ok(index.locate(key).is_some())
    }

    /// Get the value stored under `key`
    ///
    /// Returns `Ok(None)` if no chunk owns the key, or the owning chunk's
    /// file does not actually contain it.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.state.enter();
        let index = state.index.fetch()?;

        let chunk_id = match index.locate(key) {
            Some(id) => id,
            None => return Ok(None),
        };

        Ok(state
            .chunk(chunk_id)
            .fetch()?
            .and_then(|mut data| data.remove(key)))
    }

    /// Insert or overwrite `key`
    ///
    /// Existing keys are updated in place. New keys go to the first chunk
    /// (index order) with room, or to a freshly created chunk.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.enter();
        let state = &mut *state;
        let mut index = state.index.fetch()?;

        // Existing key: chunk file only
        if let Some(chunk_id) = index.locate(key) {
            let chunk = state.chunk(chunk_id);
            let mut data = chunk.fetch()?.unwrap_or_default();
            data.insert(key.to_string(), value);
            return chunk.save(&data);
        }

        let max_chunk_size = self.config.max_chunk_size;
        let open_chunk = index
            .chunks
            .iter_mut()
            .find(|chunk| chunk.keys.len() < max_chunk_size);

        match open_chunk {
            Some(descriptor) => {
                descriptor.keys.push(key.to_string());
                let chunk_id = descriptor.id.clone();
                state.index.save(&index)?;

                let chunk = state.chunk(&chunk_id);
                let mut data = chunk.fetch()?.unwrap_or_default();
                data.insert(key.to_string(), value);
                chunk.save(&data)
            }
            None => {
                let chunk_id = state.ids.generate().to_string();
                index
                    .chunks
                    .push(ChunkDescriptor::new(&chunk_id, vec![key.to_string()]));
                state.index.save(&index)?;

                let mut data = ChunkData::new();
                data.insert(key.to_string(), value);
                state.chunk(&chunk_id).save(&data)?;

                tracing::debug!(chunk = %chunk_id, chunks = index.chunks.len(), "Created chunk");
                Ok(())
            }
        }
    }

    /// Remove `key`
    ///
    /// Returns `false` if no chunk owns the key. Chunks left without keys
    /// are removed from the index and their files deleted.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.enter();
        let mut index = state.index.fetch()?;

        let chunk_id = match index.locate(key) {
            Some(id) => id.to_string(),
            None => return Ok(false),
        };

        // Step 1: Chunk file
        let chunk = state.chunk(&chunk_id);
        if let Some(mut data) = chunk.fetch()? {
            data.remove(key);
            chunk.save(&data)?;
        }

        // Step 2: Index (drop the key and any chunk that is now empty)
        for descriptor in index.chunks.iter_mut() {
            descriptor.keys.retain(|k| k != key);
        }
        let (empty, kept): (Vec<_>, Vec<_>) = index
            .chunks
            .into_iter()
            .partition(|chunk| chunk.keys.is_empty());
        index.chunks = kept;
        state.index.save(&index)?;

        // Step 3: Cleanup
        for descriptor in &empty {
            state.remove_chunk(&descriptor.id)?;
            tracing::debug!(chunk = %descriptor.id, "Removed empty chunk");
        }

        Ok(true)
    }

    /// Remove every key and chunk, and reset the auto-key counter
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.enter();
        let mut index = state.index.fetch()?;

        for descriptor in &index.chunks {
            state.remove_chunk(&descriptor.id)?;
        }
        state.chunks.clear();

        let removed = index.chunks.len();
        index.chunks.clear();
        index.auto_key_count = 0;
        state.index.save(&index)?;

        tracing::debug!(chunks = removed, "Cleared store");
        Ok(())
    }

    /// Number of keys (index only)
    pub fn size(&self) -> Result<usize> {
        let state = self.state.enter();
        Ok(state.index.fetch()?.key_count())
    }

    /// All keys (index only)
    pub fn keys(&self) -> Result<Vec<String>> {
        let state = self.state.enter();
        Ok(state.index.fetch()?.keys())
    }

    /// All values (reads every chunk file)
    pub fn values(&self) -> Result<Vec<Value>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    /// All key-value pairs (reads every chunk file)
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        let mut state = self.state.enter();
        let index = state.index.fetch()?;

        let mut entries = Vec::with_capacity(index.key_count());
        for descriptor in &index.chunks {
            if let Some(data) = state.chunk(&descriptor.id).fetch()? {
                entries.extend(data);
            }
        }

        Ok(entries)
    }

    /// Next auto-generated key for this store ("1", "2", ...)
    pub fn auto_key(&self) -> Result<String> {
        let state = self.state.enter();
        let mut index = state.index.fetch()?;
        index.auto_key_count += 1;
        state.index.save(&index)?;
        Ok(index.auto_key_count.to_string())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the store directory path
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of chunk `id`'s file
    pub fn chunk_path(&self, id: &str) -> PathBuf {
        self.directory.join(ChunkStore::file_name(id))
    }

    /// Path of the index file
    pub fn index_path(&self) -> PathBuf {
        self.directory.join(IndexStore::FILENAME)
    }

    /// Chunk descriptors currently in the index
    pub fn chunks(&self) -> Result<Vec<ChunkDescriptor>> {
        let state = self.state.enter();
        Ok(state.index.fetch()?.chunks)
    }

    /// Number of cached chunk handles
    pub fn cached_handle_count(&self) -> usize {
        self.state.enter().chunks.len()
    }
}
