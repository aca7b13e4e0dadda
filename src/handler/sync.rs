//! Synchronize
//!
//! Repair pass reconciling the index with the chunk files.

use std::collections::HashSet;

use crate::chunk::ChunkDescriptor;
use crate::error::Result;

use super::ChunkHandler;

/// Result of a synchronize pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Descriptors kept in the index
    pub chunks_checked: usize,

    /// Descriptors dropped because their file is missing
    pub missing_chunks: usize,

    /// Descriptors dropped because their file holds no keys
    pub empty_chunks: usize,

    /// Keys removed from oversized chunk files
    pub trimmed_keys: usize,

    /// Keys removed because an earlier chunk already owns them
    pub duplicate_keys: usize,

    /// Keys found in a file but missing from its descriptor
    pub added_keys: usize,

    /// Descriptor keys with no entry in the file
    pub dropped_keys: usize,
}

impl SyncReport {
    /// Whether the pass changed anything
    pub fn is_clean(&self) -> bool {
        self.missing_chunks == 0
            && self.empty_chunks == 0
            && self.trimmed_keys == 0
            && self.duplicate_keys == 0
            && self.added_keys == 0
            && self.dropped_keys == 0
    }
}

impl ChunkHandler {
    /// Reconcile every descriptor with its chunk file
    ///
    /// Per descriptor, in index order:
    /// 1. Missing file → descriptor dropped (its keys are lost)
    /// 2. Keys already owned by an earlier chunk → removed from this file
    /// 3. More than `max_chunk_size` entries → file trimmed to the first
    ///    `max_chunk_size` keys (ascending key order)
    /// 4. Descriptor keys set to exactly the file's keys
    /// 5. Empty file → file deleted, descriptor dropped
    ///
    /// The index is written once at the end. Running it twice in a row
    /// leaves the index unchanged the second time.
    pub fn synchronize(&self) -> Result<SyncReport> {
        let mut state = self.state.enter();
        let mut index = state.index.fetch()?;
        let max_chunk_size = self.config.max_chunk_size;

        let mut report = SyncReport::default();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut chunks: Vec<ChunkDescriptor> = Vec::with_capacity(index.chunks.len());

        for mut descriptor in std::mem::take(&mut index.chunks) {
            let fetched = state.chunk(&descriptor.id).fetch()?;
            let mut data = match fetched {
                Some(data) => data,
                None => {
                    tracing::warn!(
                        chunk = %descriptor.id,
                        lost_keys = descriptor.keys.len(),
                        "Chunk file missing, dropping descriptor"
                    );
                    state.chunks.remove(&descriptor.id);
                    report.missing_chunks += 1;
                    continue;
                }
            };
            let mut dirty = false;

            // Step 2: Keys owned by an earlier chunk
            let duplicates: Vec<String> = data
                .keys()
                .filter(|key| claimed.contains(*key))
                .cloned()
                .collect();
            for key in &duplicates {
                data.remove(key);
            }
            report.duplicate_keys += duplicates.len();
            dirty |= !duplicates.is_empty();

            // Step 3: Oversized file
            if data.len() > max_chunk_size {
                let excess: Vec<String> = data.keys().skip(max_chunk_size).cloned().collect();
                for key in &excess {
                    data.remove(key);
                }
                tracing::warn!(
                    chunk = %descriptor.id,
                    trimmed = excess.len(),
                    "Chunk exceeded max size, trimmed"
                );
                report.trimmed_keys += excess.len();
                dirty = true;
            }

            // Step 5: Nothing left
            if data.is_empty() {
                state.remove_chunk(&descriptor.id)?;
                report.empty_chunks += 1;
                continue;
            }

            if dirty {
                state.chunk(&descriptor.id).save(&data)?;
            }

            // Step 4: Reconcile descriptor keys with the file
            let before = descriptor.keys.len();
            let mut seen: HashSet<String> = HashSet::new();
            descriptor
                .keys
                .retain(|key| data.contains_key(key) && seen.insert(key.clone()));
            report.dropped_keys += before - descriptor.keys.len();

            for key in data.keys() {
                if !seen.contains(key) {
                    descriptor.keys.push(key.clone());
                    report.added_keys += 1;
                }
            }

            claimed.extend(descriptor.keys.iter().cloned());
            chunks.push(descriptor);
        }

        report.chunks_checked = chunks.len();
        index.chunks = chunks;
        state.index.save(&index)?;

        tracing::info!(
            chunks = report.chunks_checked,
            missing = report.missing_chunks,
            empty = report.empty_chunks,
            trimmed = report.trimmed_keys,
            duplicates = report.duplicate_keys,
            added = report.added_keys,
            dropped = report.dropped_keys,
            "Synchronize complete"
        );

        Ok(report)
    }
}
