//! Error types for ChunkKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ChunkError
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Unified error type for ChunkKV operations
#[derive(Debug, Error)]
pub enum ChunkError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file operation kept failing until its retry budget ran out
    #[error("{operation} failed for {path:?} after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: &'static str,
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ChunkError {
    fn from(err: serde_json::Error) -> Self {
        ChunkError::Serialization(err.to_string())
    }
}
