//! Atomic File
//!
//! Single-file JSON primitive with retry-with-delay on I/O failure.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RetryPolicy;
use crate::error::{ChunkError, Result};

/// A JSON document on disk
///
/// Every I/O call is retried according to the file's `RetryPolicy`.
/// Serialization failures are returned immediately; retrying cannot fix them.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    /// Absolute or data-dir relative path of the document
    path: PathBuf,

    /// Retry policy for every I/O call
    retry: RetryPolicy,
}

impl AtomicFile {
    /// Create a handle for the file at `path` (does not touch the disk)
    pub fn new(path: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            path: path.into(),
            retry,
        }
    }

    /// Path of this file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document
    ///
    /// Bytes that are not valid UTF-8 JSON are a `Serialization` error.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.attempt("read", || fs::read(&self.path))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Serialize `data` and overwrite the document
    ///
    /// The content is fsynced before returning.
    pub fn write<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let payload = serde_json::to_vec(data)?;

        self.attempt("write", || {
            let mut file = File::create(&self.path)?;
            file.write_all(&payload)?;
            file.sync_all()
        })
    }

    /// Copy this file to `to`, replacing any existing file there
    pub fn copy(&self, to: &Path) -> Result<()> {
        self.attempt("copy", || fs::copy(&self.path, to).map(|_| ()))
    }

    /// Rename this file onto `to` (atomic within one filesystem)
    pub fn rename(&self, to: &Path) -> Result<()> {
        self.attempt("rename", || fs::rename(&self.path, to))
    }

    /// Remove this file
    pub fn delete(&self) -> Result<()> {
        self.attempt("delete", || fs::remove_file(&self.path))
    }

    /// Whether the file currently exists (never retried)
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `op`, retrying on I/O failure until the policy is exhausted
    ///
    /// Errors that no retry can fix are returned as `Io` right away.
    fn attempt<T, F>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> io::Result<T>,
    {
        let mut remaining = self.retry.attempts;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if !is_transient(&err) => return Err(ChunkError::Io(err)),
                Err(source) if remaining == 0 => {
                    return Err(ChunkError::RetriesExhausted {
                        operation,
                        path: self.path.clone(),
                        attempts: self.retry.attempts + 1,
                        source,
                    });
                }
                Err(err) => {
                    remaining -= 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        remaining,
                        "{} failed: {}, retrying in {}ms",
                        operation,
                        err,
                        self.retry.delay_ms
                    );
                    thread::sleep(Duration::from_millis(self.retry.delay_ms));
                }
            }
        }
    }
}

/// Whether retrying an operation that failed with `err` can succeed
fn is_transient(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => false,
        // Sharing violations surface as PermissionDenied on Windows
        io::ErrorKind::PermissionDenied => cfg!(windows),
        _ => true,
    }
}
