//! Staging Recovery
//!
//! Resolves `.temp-{id}.json.lock` files left behind by an unclean shutdown.

use std::collections::HashSet;
use std::fs;

use crate::chunk::{ChunkStore, IndexStore};
use crate::error::Result;
use crate::file::{StagedFile, StagingOutcome};

use super::HandlerState;

/// Result of a staging recovery pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Complete staging files renamed onto their canonical path
    pub replayed: usize,

    /// Torn or orphaned staging files deleted
    pub discarded: usize,
}

impl RecoveryReport {
    fn record(&mut self, outcome: StagingOutcome) {
        match outcome {
            StagingOutcome::Replayed => self.replayed += 1,
            StagingOutcome::Discarded => self.discarded += 1,
            StagingOutcome::Clean => {}
        }
    }
}

/// Recover staging files, then make sure the index exists
///
/// Order matters:
/// 1. The index staging file first, so the chunk check sees the newest index
/// 2. Chunk staging files: replayed only if the index still references the id
pub(super) fn recover_staging(state: &mut HandlerState) -> Result<RecoveryReport> {
    let mut report = RecoveryReport::default();

    // Step 1: Index
    report.record(state.index.recover()?);
    let index = state.index.fetch()?;

    // Step 2: Chunks
    let referenced: HashSet<&str> = index.chunks.iter().map(|c| c.id.as_str()).collect();

    for id in staged_chunk_ids(state)? {
        let chunk = ChunkStore::new(&state.directory, &id, state.retry);
        let outcome = if referenced.contains(id.as_str()) {
            chunk.recover()?
        } else {
            chunk.discard_staged()?
        };
        tracing::debug!(chunk = %id, ?outcome, "Recovered staging file");
        report.record(outcome);
    }

    Ok(report)
}

/// Ids of chunk staging files present in the store directory
fn staged_chunk_ids(state: &HandlerState) -> Result<Vec<String>> {
    let mut ids = Vec::new();

    for entry in fs::read_dir(&state.directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some(id) = StagedFile::parse_staging_id(&file_name) {
            if id != IndexStore::STAGING_ID {
                ids.push(id.to_string());
            }
        }
    }

    ids.sort();
    Ok(ids)
}
