//! # ChunkKV
//!
//! An embedded, file-backed key-value store with:
//! - Records sharded across size-bounded JSON chunk files
//! - An index file mapping every key to its chunk
//! - Atomic, staged (write-then-rename) persistence of every file
//! - FIFO-gated operations within one process
//! - A synchronize pass that repairs index/chunk divergence
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ChunkHandler                            │
//! │        has / get / set / delete / clear / keys / ...         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  FIFO gate
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ IndexStore  │          │ ChunkStore  │  (one per chunk)
//!   │ index.json  │          │ {id}.json   │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  StagedFile   │  .temp-{id}.json.lock → rename
//!               │  AtomicFile   │  retry-with-delay
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod file;
pub mod chunk;
pub mod handler;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChunkError, Result};
pub use config::{Config, RetryPolicy};
pub use handler::{ChunkHandler, RecoveryReport, SyncReport};
pub use serde_json::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ChunkKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
