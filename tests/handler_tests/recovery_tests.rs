//! Tests for staging-file recovery during init
//!
//! These tests verify:
//! - Complete index/chunk staging files are replayed
//! - Torn staging files are discarded, including ones cut mid-UTF-8
//! - Staging files for chunks the index no longer knows are discarded

use std::fs;

use chunkkv::ChunkHandler;
use serde_json::json;
use tempfile::TempDir;

use crate::common::{config, store_files};

fn staging_path(handler: &ChunkHandler, id: &str) -> std::path::PathBuf {
    handler.directory().join(format!(".temp-{}.json.lock", id))
}

#[test]
fn test_replays_complete_chunk_staging_file() {
    let temp = TempDir::new().unwrap();
    let id = {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        handler.set("a", json!(1)).unwrap();
        let id = handler.chunks().unwrap()[0].id.clone();

        // Crash after writing the staging file, before the rename
        fs::write(staging_path(&handler, &id), br#"{"a":2}"#).unwrap();
        id
    };

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.get("a").unwrap(), Some(json!(2)));
    assert!(!staging_path(&handler, &id).exists());
}

#[test]
fn test_discards_torn_chunk_staging_file() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        handler.set("a", json!(1)).unwrap();
        let id = handler.chunks().unwrap()[0].id.clone();
        fs::write(staging_path(&handler, &id), br#"{"a":"#).unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.get("a").unwrap(), Some(json!(1)));
    assert!(store_files(&handler).iter().all(|name| !name.ends_with(".lock")));
}

#[test]
fn test_discards_chunk_staging_file_torn_inside_utf8() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        handler.set("a", json!("é")).unwrap();
        let id = handler.chunks().unwrap()[0].id.clone();
        fs::write(staging_path(&handler, &id), b"{\"a\":\"\xC3").unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.get("a").unwrap(), Some(json!("é")));
    assert!(store_files(&handler).iter().all(|name| !name.ends_with(".lock")));
}

#[test]
fn test_discards_staging_file_of_unknown_chunk() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        fs::write(staging_path(&handler, "123456"), br#"{"ghost":1}"#).unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(store_files(&handler), vec!["index.json".to_string()]);
    assert!(!handler.has("ghost").unwrap());
}

#[test]
fn test_replays_complete_index_staging_file() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        let index = json!({ "name": "test", "autoKeyCount": 7, "chunks": [] });
        fs::write(
            staging_path(&handler, "index"),
            serde_json::to_vec(&index).unwrap(),
        )
        .unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.auto_key().unwrap(), "8");
    assert!(!staging_path(&handler, "index").exists());
}

#[test]
fn test_discards_torn_index_staging_file() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        handler.set("a", json!(1)).unwrap();
        fs::write(staging_path(&handler, "index"), br#"{"name":"te"#).unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.keys().unwrap(), vec!["a"]);
    assert!(!staging_path(&handler, "index").exists());
}

#[test]
fn test_discards_index_staging_file_torn_inside_utf8() {
    let temp = TempDir::new().unwrap();
    {
        let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();
        handler.set("a", json!(1)).unwrap();
        fs::write(staging_path(&handler, "index"), b"{\"name\":\"t\xC3").unwrap();
    }

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.keys().unwrap(), vec!["a"]);
    assert!(!staging_path(&handler, "index").exists());
}

#[test]
fn test_index_staging_without_canonical_index() {
    let temp = TempDir::new().unwrap();
    let store_dir = temp.path().join("test");
    fs::create_dir_all(&store_dir).unwrap();

    // Crash during the very first index save
    let index = json!({ "name": "test", "autoKeyCount": 2, "chunks": [] });
    fs::write(
        store_dir.join(".temp-index.json.lock"),
        serde_json::to_vec(&index).unwrap(),
    )
    .unwrap();

    let handler = ChunkHandler::open(config(temp.path(), 5)).unwrap();

    assert_eq!(handler.auto_key().unwrap(), "3");
    assert_eq!(store_files(&handler), vec!["index.json".to_string()]);
}
