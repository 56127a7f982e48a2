mod common;

use std::fs;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::Reply;
use keydex_core::store::KeywordRecord;
use keydex_core::{
    index_directory, CancelToken, CatalogStore, Config, FileRecord, SqliteStore, StoreError,
};
use tempfile::TempDir;

fn create_test_store() -> (SqliteStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&temp_dir.path().join("nested/catalog.db")).unwrap();
    (store, temp_dir)
}

fn record(path: &str, name: &str) -> FileRecord {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    FileRecord {
        id: None,
        path: path.to_string(),
        name: name.to_string(),
        extension: "txt".to_string(),
        created_at: created,
        modified_at: created,
        size_bytes: 42,
        content_hash: "deadbeef".to_string(),
    }
}

#[test]
fn test_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("catalog.db");

    let id = {
        let store = SqliteStore::open(&db).unwrap();
        let id = store.create_file(&record("/r/a.txt", "a.txt")).unwrap();
        store
            .create_keywords(&[KeywordRecord::new(id, "alpha"), KeywordRecord::new(id, "beta")])
            .unwrap();
        id
    };

    let store = SqliteStore::open(&db).unwrap();
    let loaded = store.get_file_by_path("/r/a.txt").unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(loaded.created_at, record("/r/a.txt", "a.txt").created_at);
    assert_eq!(loaded.size_bytes, 42);
    assert_eq!(store.keywords_for_file(id).unwrap(), vec!["alpha", "beta"]);
}

#[test]
fn test_duplicate_path_is_typed() {
    let (store, _temp) = create_test_store();
    store.create_file(&record("/r/a.txt", "a.txt")).unwrap();

    let err = store.create_file(&record("/r/a.txt", "a.txt")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePath(ref p) if p == "/r/a.txt"));
}

#[test]
fn test_search_by_name_and_keyword_prefix() {
    let (store, _temp) = create_test_store();
    let a = store.create_file(&record("/r/Report.txt", "Report.txt")).unwrap();
    let b = store.create_file(&record("/r/notes.txt", "notes.txt")).unwrap();
    store
        .create_keywords(&[
            KeywordRecord::new(a, "operating systems"),
            KeywordRecord::new(b, "operations"),
            KeywordRecord::new(b, "semester"),
        ])
        .unwrap();

    let by_name = store.search_files_by_name("report").unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Report.txt");

    let hits = store.search_keywords("Oper").unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.keyword.starts_with("oper")));
}

#[cfg(unix)]
#[test]
fn test_directory_lifecycle() {
    let (store, _temp) = create_test_store();
    store.add_directory("/r").unwrap();
    store.create_file(&record("/r/a.txt", "a.txt")).unwrap();
    store.create_file(&record("/r/deep/b.txt", "b.txt")).unwrap();
    store.create_file(&record("/rx/c.txt", "c.txt")).unwrap();

    assert!(matches!(store.add_directory("/r"), Err(StoreError::DuplicateDirectory(_))));
    assert_eq!(store.count_files_under("/r").unwrap(), 2);

    let entry = store.set_whitelisted("/r", false).unwrap();
    assert!(!entry.is_whitelisted);
    assert_eq!(store.list_directories(false).unwrap().len(), 1);
    assert!(store.list_directories(true).unwrap().is_empty());

    assert_eq!(store.remove_directory("/r").unwrap(), 2);
    assert!(store.get_directory("/r").unwrap().is_none());
    assert!(store.get_file_by_path("/rx/c.txt").unwrap().is_some());
}

#[tokio::test]
async fn test_index_into_sqlite_catalog() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a.txt"), "hello world").unwrap();
    fs::write(root.path().join("b.bin"), [0u8, 1, 2]).unwrap();

    let (url, _service) = common::spawn(Reply::Text("- hello\n- world\n".into())).await;
    let mut config = Config::default();
    config.llm.base_url = url;

    let (store, _temp) = create_test_store();
    let store = Arc::new(store);
    let report = index_directory(root.path(), &config, store.clone(), CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.files_recorded, 2);

    let hits = store.search_keywords("hel").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file.name, "a.txt");
}
