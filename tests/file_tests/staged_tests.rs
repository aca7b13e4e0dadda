//! Tests for StagedFile
//!
//! These tests verify:
//! - save: staging file written then renamed; nothing left at rest
//! - fetch: absent file, private copy removed afterwards
//! - recover: replaying complete staging files, discarding torn ones

use std::fs;
use std::path::Path;

use chunkkv::config::RetryPolicy;
use chunkkv::file::{StagedFile, StagingOutcome};
use chunkkv::ChunkError;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn staged(dir: &Path) -> StagedFile {
    StagedFile::new(dir, "doc.json", "doc", RetryPolicy::none())
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Naming Tests
// =============================================================================

#[test]
fn test_staging_path_is_in_same_directory() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    assert_eq!(file.path(), temp.path().join("doc.json"));
    assert_eq!(file.staging_path(), temp.path().join(".temp-doc.json.lock"));
}

#[test]
fn test_parse_staging_id() {
    assert_eq!(StagedFile::parse_staging_id(".temp-42.json.lock"), Some("42"));
    assert_eq!(StagedFile::parse_staging_id(".temp-index.json.lock"), Some("index"));
    assert_eq!(StagedFile::parse_staging_id(".temp-.json.lock"), None);
    assert_eq!(StagedFile::parse_staging_id("42.json"), None);
    assert_eq!(StagedFile::parse_staging_id("index.json"), None);
}

// =============================================================================
// Save/Fetch Tests
// =============================================================================

#[test]
fn test_fetch_missing_returns_none() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    assert_eq!(file.fetch::<Value>().unwrap(), None);
    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn test_save_leaves_no_staging_file() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    file.save(&json!({ "a": 1 })).unwrap();

    assert_eq!(file_names(temp.path()), vec!["doc.json".to_string()]);
}

#[test]
fn test_save_then_fetch() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    file.save(&json!({ "a": 1, "b": "two" })).unwrap();
    let fetched: Option<Value> = file.fetch().unwrap();

    assert_eq!(fetched, Some(json!({ "a": 1, "b": "two" })));
    assert_eq!(file_names(temp.path()), vec!["doc.json".to_string()]);
}

#[test]
fn test_save_replaces_previous_content() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    file.save(&json!({ "v": 1 })).unwrap();
    file.save(&json!({ "v": 2 })).unwrap();

    assert_eq!(file.fetch::<Value>().unwrap(), Some(json!({ "v": 2 })));
}

#[test]
fn test_fetch_corrupt_file_removes_private_copy() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());
    fs::write(file.path(), b"{\"torn\":").unwrap();

    let result = file.fetch::<Value>();

    assert!(matches!(result, Err(ChunkError::Serialization(_))));
    assert!(!file.staging_path().exists());
    assert!(file.path().exists());
}

#[test]
fn test_delete() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());
    file.save(&json!({})).unwrap();

    file.delete().unwrap();

    assert!(!file.exists());
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_without_staging_file_is_clean() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    assert_eq!(file.recover::<Value>().unwrap(), StagingOutcome::Clean);
}

#[test]
fn test_recover_replays_complete_staging_file() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());
    file.save(&json!({ "v": "old" })).unwrap();

    // Simulate a crash between write and rename
    fs::write(file.staging_path(), br#"{"v":"new"}"#).unwrap();

    assert_eq!(file.recover::<Value>().unwrap(), StagingOutcome::Replayed);
    assert!(!file.staging_path().exists());
    assert_eq!(file.fetch::<Value>().unwrap(), Some(json!({ "v": "new" })));
}

#[test]
fn test_recover_discards_torn_staging_file() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());
    file.save(&json!({ "v": "old" })).unwrap();

    // Simulate a crash in the middle of the write
    fs::write(file.staging_path(), br#"{"v":"ne"#).unwrap();

    assert_eq!(file.recover::<Value>().unwrap(), StagingOutcome::Discarded);
    assert!(!file.staging_path().exists());
    assert_eq!(file.fetch::<Value>().unwrap(), Some(json!({ "v": "old" })));
}

#[test]
fn test_discard_staged() {
    let temp = TempDir::new().unwrap();
    let file = staged(temp.path());

    assert_eq!(file.discard_staged().unwrap(), StagingOutcome::Clean);

    fs::write(file.staging_path(), b"{}").unwrap();
    assert_eq!(file.discard_staged().unwrap(), StagingOutcome::Discarded);
    assert!(!file.staging_path().exists());
    assert!(!file.exists());
}
