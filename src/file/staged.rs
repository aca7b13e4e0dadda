//! Staged File
//!
//! Write-to-temp-then-rename persistence shared by chunk and index stores.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RetryPolicy;
use crate::error::{ChunkError, Result};

use super::AtomicFile;

/// File name prefix of staging files
pub const STAGING_PREFIX: &str = ".temp-";

/// File name suffix of staging files
pub const STAGING_SUFFIX: &str = ".json.lock";

/// What `StagedFile::recover` did with a leftover staging file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingOutcome {
    /// No staging file was present
    Clean,

    /// A complete document was renamed onto the canonical path
    Replayed,

    /// An unreadable staging file was deleted
    Discarded,
}

/// A canonical JSON file paired with its staging file
///
/// ## Invariants
/// - The staging file lives in the same directory as the canonical file,
///   so the final rename never crosses a filesystem boundary
/// - The staging file does not exist at rest
#[derive(Debug, Clone)]
pub struct StagedFile {
    canonical: AtomicFile,
    staging: AtomicFile,
}

impl StagedFile {
    /// Pair `{dir}/{file_name}` with `{dir}/.temp-{staging_id}.json.lock`
    pub fn new(dir: &Path, file_name: &str, staging_id: &str, retry: RetryPolicy) -> Self {
        Self {
            canonical: AtomicFile::new(dir.join(file_name), retry),
            staging: AtomicFile::new(dir.join(Self::staging_name(staging_id)), retry),
        }
    }

    /// Staging file name for an id: ".temp-{id}.json.lock"
    pub fn staging_name(id: &str) -> String {
        format!("{}{}{}", STAGING_PREFIX, id, STAGING_SUFFIX)
    }

    /// Parse the id out of a staging file name
    /// ".temp-42.json.lock" → Some("42")
    pub fn parse_staging_id(file_name: &str) -> Option<&str> {
        let id = file_name
            .strip_prefix(STAGING_PREFIX)?
            .strip_suffix(STAGING_SUFFIX)?;
        (!id.is_empty()).then_some(id)
    }

    /// Canonical path
    pub fn path(&self) -> &Path {
        self.canonical.path()
    }

    /// Staging path
    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Whether the canonical file exists
    pub fn exists(&self) -> bool {
        self.canonical.exists()
    }

    /// Read the canonical file through a private copy
    ///
    /// Returns `Ok(None)` if the canonical file does not exist.
    pub fn fetch<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if !self.canonical.exists() {
            return Ok(None);
        }

        self.canonical.copy(self.staging.path())?;

        // Remove the copy even when parsing fails
        let parsed = self.staging.read::<T>();
        let removed = self.staging.delete();

        let data = parsed?;
        removed?;
        Ok(Some(data))
    }

    /// Persist `data`: write the staging file, then rename it over the canonical path
    pub fn save<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.staging.write(data)?;
        self.staging.rename(self.canonical.path())
    }

    /// Remove the canonical file
    pub fn delete(&self) -> Result<()> {
        self.canonical.delete()
    }

    /// Resolve a staging file left behind by an interrupted save or fetch
    ///
    /// A staging file that parses as `T` is renamed onto the canonical path;
    /// a torn one is deleted.
    pub fn recover<T: DeserializeOwned>(&self) -> Result<StagingOutcome> {
        if !self.staging.exists() {
            return Ok(StagingOutcome::Clean);
        }

        match self.staging.read::<T>() {
            Ok(_) => {
                self.staging.rename(self.canonical.path())?;
                Ok(StagingOutcome::Replayed)
            }
            Err(ChunkError::Serialization(reason)) => {
                tracing::warn!(
                    path = %self.staging.path().display(),
                    "discarding torn staging file: {}",
                    reason
                );
                self.staging.delete()?;
                Ok(StagingOutcome::Discarded)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the staging file without looking at it
    pub fn discard_staged(&self) -> Result<StagingOutcome> {
        if !self.staging.exists() {
            return Ok(StagingOutcome::Clean);
        }
        self.staging.delete()?;
        Ok(StagingOutcome::Discarded)
    }
}
