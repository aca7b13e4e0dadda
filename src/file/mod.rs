//! File Module
//!
//! JSON file primitives shared by the chunk and index stores.
//!
//! ## Responsibilities
//! - Read/write whole JSON documents with bounded retry on I/O failure
//! - Copy, rename and delete as building blocks
//! - Atomic replace via a staging file in the same directory
//!
//! ## Staged Write
//! ```text
//!   save(data)                          fetch()
//!   ──────────                          ───────
//!   write  → .temp-{id}.json.lock       copy   {name}.json → .temp-{id}.json.lock
//!   rename → {name}.json  (atomic)      parse  .temp-{id}.json.lock
//!                                       delete .temp-{id}.json.lock
//! ```
//!
//! A staging file left behind after a crash holds either a full document
//! (replayable) or a torn write (discardable); the canonical file is never
//! partial.

mod atomic;
mod staged;

pub use atomic::AtomicFile;
pub use staged::{StagedFile, StagingOutcome, STAGING_PREFIX, STAGING_SUFFIX};
