//! Chunk ID generation
//!
//! Snowflake ids: time-ordered, unique within a process.
//!
//! ```text
//! ┌──────────────────────────┬──────────┬───────────┬─────────────┐
//! │ millis since epoch (42)  │worker (5)│process (5)│increment(12)│
//! └──────────────────────────┴──────────┴───────────┴─────────────┘
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: 2010-11-04T01:42:54.657Z
pub const TWITTER_EPOCH: u64 = 1_288_834_974_657;

const WORKER_ID: u64 = 0;
const PROCESS_ID: u64 = 1;
const INCREMENT_MASK: u64 = 0xFFF;
const TIMESTAMP_SHIFT: u32 = 22;

/// Generates strictly increasing snowflake ids
#[derive(Debug)]
pub struct ChunkIdGenerator {
    /// Epoch in unix millis
    epoch: u64,

    /// Rolling 12-bit counter
    increment: u64,

    /// Last id handed out
    last: u64,
}

impl ChunkIdGenerator {
    pub fn new(epoch: Option<u64>) -> Self {
        Self {
            epoch: epoch.unwrap_or(TWITTER_EPOCH),
            increment: 0,
            last: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the epoch lies after the current wall-clock time
    pub fn epoch_is_future(&self) -> bool {
        self.epoch > now_millis()
    }

    /// Record an id issued earlier (e.g. by a previous process)
    ///
    /// Later ids are strictly greater than every observed id.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    /// Next id
    ///
    /// Ids never repeat or decrease, even if the clock stalls or steps back.
    pub fn generate(&mut self) -> u64 {
        let now = now_millis();

        let increment = self.increment;
        self.increment = (self.increment + 1) & INCREMENT_MASK;

        let candidate = (now.saturating_sub(self.epoch) << TIMESTAMP_SHIFT)
            | (WORKER_ID << 17)
            | (PROCESS_ID << 12)
            | increment;

        let id = if candidate > self.last {
            candidate
        } else {
            self.last + 1
        };
        self.last = id;
        id
    }

    /// Unix millis encoded in an id produced with this generator's epoch
    pub fn timestamp_of(&self, id: u64) -> u64 {
        (id >> TIMESTAMP_SHIFT) + self.epoch
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
