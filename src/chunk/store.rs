//! Chunk Store
//!
//! One shard persisted as `{chunk_id}.json`.

use std::path::Path;

use crate::config::RetryPolicy;
use crate::error::Result;
use crate::file::{StagedFile, StagingOutcome};

use super::ChunkData;

/// Handle to a single chunk file
#[derive(Debug, Clone)]
pub struct ChunkStore {
    /// Chunk id
    id: String,

    /// Backing file (staged under ".temp-{id}.json.lock")
    file: StagedFile,
}

impl ChunkStore {
    /// Create a handle for chunk `id` in `dir` (does not touch the disk)
    pub fn new(dir: &Path, id: &str, retry: RetryPolicy) -> Self {
        Self {
            id: id.to_string(),
            file: StagedFile::new(dir, &Self::file_name(id), id, retry),
        }
    }

    /// Chunk file name for an id: "{id}.json"
    pub fn file_name(id: &str) -> String {
        format!("{}.json", id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn exists(&self) -> bool {
        self.file.exists()
    }

    /// Load the chunk
    ///
    /// Returns:
    /// - `Ok(Some(data))`: chunk file exists (possibly empty)
    /// - `Ok(None)`: chunk file was never created or has been removed
    pub fn fetch(&self) -> Result<Option<ChunkData>> {
        self.file.fetch()
    }

    /// Persist the chunk atomically
    pub fn save(&self, data: &ChunkData) -> Result<()> {
        self.file.save(data)
    }

    /// Remove the chunk file
    pub fn delete(&self) -> Result<()> {
        self.file.delete()
    }

    /// Replay or discard a leftover staging file for this chunk
    pub fn recover(&self) -> Result<StagingOutcome> {
        self.file.recover::<ChunkData>()
    }

    /// Delete a leftover staging file for this chunk
    pub fn discard_staged(&self) -> Result<StagingOutcome> {
        self.file.discard_staged()
    }
}
