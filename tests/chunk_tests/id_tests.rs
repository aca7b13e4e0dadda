//! Tests for ChunkIdGenerator
//!
//! These tests verify:
//! - Ids strictly increase, including bursts within one millisecond
//! - The embedded timestamp matches the wall clock
//! - Custom epochs
//! - Observed ids bound later ids from below

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use chunkkv::chunk::{ChunkIdGenerator, TWITTER_EPOCH};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[test]
fn test_default_epoch() {
    let generator = ChunkIdGenerator::new(None);
    assert_eq!(generator.epoch(), TWITTER_EPOCH);
}

#[test]
fn test_ids_strictly_increase() {
    let mut generator = ChunkIdGenerator::new(None);

    let mut previous = generator.generate();
    for _ in 0..10_000 {
        let id = generator.generate();
        assert!(id > previous);
        previous = id;
    }
}

#[test]
fn test_ids_are_unique_beyond_increment_range() {
    let mut generator = ChunkIdGenerator::new(None);

    // More than 4096 ids: the 12-bit increment wraps
    let ids: HashSet<u64> = (0..10_000).map(|_| generator.generate()).collect();
    assert_eq!(ids.len(), 10_000);
}

#[test]
fn test_timestamp_matches_clock() {
    let mut generator = ChunkIdGenerator::new(None);

    let before = now_ms();
    let id = generator.generate();
    let after = now_ms();

    let timestamp = generator.timestamp_of(id);
    assert!(timestamp >= before && timestamp <= after);
}

#[test]
fn test_custom_epoch() {
    let epoch = now_ms() - 1_000;
    let mut generator = ChunkIdGenerator::new(Some(epoch));
    let mut default_generator = ChunkIdGenerator::new(None);

    let id = generator.generate();
    assert_eq!(generator.epoch(), epoch);
    assert!(id < default_generator.generate());

    let timestamp = generator.timestamp_of(id);
    assert!(timestamp >= epoch + 1_000);
}

#[test]
fn test_observed_id_bounds_next_id() {
    let mut generator = ChunkIdGenerator::new(None);
    let far = u64::MAX / 2;

    generator.observe(far);
    let id = generator.generate();
    assert!(id > far);

    // Observing a smaller id never lowers the floor
    generator.observe(1);
    assert!(generator.generate() > id);
}

#[test]
fn test_future_epoch_detected() {
    let past = ChunkIdGenerator::new(Some(now_ms() - 1_000));
    let future = ChunkIdGenerator::new(Some(now_ms() + 60_000));

    assert!(!past.epoch_is_future());
    assert!(future.epoch_is_future());
    assert!(!ChunkIdGenerator::new(None).epoch_is_future());
}
