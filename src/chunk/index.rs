//! Index Store
//!
//! The catalog file `index.json`.

use std::path::Path;

use crate::config::RetryPolicy;
use crate::error::{ChunkError, Result};
use crate::file::{StagedFile, StagingOutcome};

use super::IndexData;

/// Handle to the index file of one store
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// Store name written into a freshly created index
    name: String,

    /// Backing file (staged under ".temp-index.json.lock")
    file: StagedFile,
}

impl IndexStore {
    pub const FILENAME: &'static str = "index.json";
    pub const STAGING_ID: &'static str = "index";

    /// Create a handle for `{dir}/index.json` (does not touch the disk)
    pub fn new(dir: &Path, name: &str, retry: RetryPolicy) -> Self {
        Self {
            name: name.to_string(),
            file: StagedFile::new(dir, Self::FILENAME, Self::STAGING_ID, retry),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn exists(&self) -> bool {
        self.file.exists()
    }

    /// Load the index, creating an empty one first if it is missing
    pub fn fetch(&self) -> Result<IndexData> {
        if let Some(index) = self.file.fetch()? {
            return Ok(index);
        }

        self.save(&IndexData::new(&self.name))?;

        self.file.fetch()?.ok_or_else(|| {
            ChunkError::Corruption(format!(
                "index {} vanished right after being created",
                self.path().display()
            ))
        })
    }

    /// Persist the index atomically
    pub fn save(&self, index: &IndexData) -> Result<()> {
        self.file.save(index)
    }

    /// Replay or discard a leftover staging file for the index
    pub fn recover(&self) -> Result<StagingOutcome> {
        self.file.recover::<IndexData>()
    }
}
