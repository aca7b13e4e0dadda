//! Chunk Module
//!
//! On-disk shards and the index that catalogs them.
//!
//! ## Responsibilities
//! - Persist one chunk (flat `key → value` map) per file
//! - Persist the index: which keys live in which chunk, plus the auto-key counter
//! - Generate time-ordered chunk ids
//!
//! ## File Formats
//! ```text
//! index.json
//!   { "name": "users",
//!     "autoKeyCount": 3,
//!     "chunks": [ { "id": "1730000000000000001", "keys": ["a", "b"] }, ... ] }
//!
//! {chunk_id}.json
//!   { "a": <any JSON>, "b": <any JSON> }
//! ```

mod id;
mod index;
mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use id::{ChunkIdGenerator, TWITTER_EPOCH};
pub use index::IndexStore;
pub use store::ChunkStore;

/// Contents of a chunk file
///
/// Ordered map: enumeration order is ascending key order.
pub type ChunkData = BTreeMap<String, Value>;

/// Index entry describing one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    /// Chunk id (also the chunk's file stem)
    pub id: String,

    /// Keys stored in the chunk, in insertion order
    pub keys: Vec<String>,
}

impl ChunkDescriptor {
    pub fn new(id: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            id: id.into(),
            keys,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Contents of the index file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexData {
    /// Logical store name
    pub name: String,

    /// Last issued auto-key
    pub auto_key_count: u64,

    /// Chunk descriptors in creation order
    pub chunks: Vec<ChunkDescriptor>,
}

impl IndexData {
    /// An empty index for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_key_count: 0,
            chunks: Vec::new(),
        }
    }

    /// Id of the chunk whose descriptor lists `key`
    pub fn locate(&self, key: &str) -> Option<&str> {
        self.chunks
            .iter()
            .find(|chunk| chunk.contains(key))
            .map(|chunk| chunk.id.as_str())
    }

    /// Total number of keys across all descriptors
    pub fn key_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.keys.len()).sum()
    }

    /// All keys, chunk by chunk
    pub fn keys(&self) -> Vec<String> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.keys.iter().cloned())
            .collect()
    }
}
