//! Store integration tests.

use super::*;
use crate::config::Config;
use crate::test_support::setup_temp_db;
use serde_json::json;
use tempfile::TempDir;

fn docs(pairs: &[(&str, Value)]) -> DocumentMap {
    let mut documents = DocumentMap::new();
    for (key, value) in pairs {
        documents.insert((*key).to_string(), value.clone());
    }
    documents
}

#[test]
fn new_store_seeds_reserved_collection() {
    let (db, _temp) = setup_temp_db();
    assert_eq!(db.list_collections().expect("list"), vec!["system"]);
    let system = db.get_collection("system").expect("system");
    assert!(system.contains_key("publishinfo"));

    let history = db.get_key_history("system", "publishinfo").expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "Added database [system]");
    assert!(history[0].parent_ids.is_empty());
}

#[test]
fn seeding_can_be_disabled_through_config() {
    let temp = TempDir::new().expect("temp dir");
    let config = Config {
        db_path: temp.path().join("db").to_string_lossy().to_string(),
        seed_reserved: false,
        ..Config::default()
    };
    let db = Database::open(&config).expect("open");
    assert!(db.list_collections().expect("list").is_empty());
}

#[test]
fn reopening_keeps_data_and_does_not_reseed() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("db").to_string_lossy().to_string();
    {
        let db = Database::new(&path).expect("db");
        db.put_key("system", "tags", &json!({"neutral": ["a"]}))
            .expect("put tags");
    }
    let db = Database::new(&path).expect("reopen");
    let system = db.get_collection("system").expect("system");
    assert_eq!(system.get("tags"), Some(&json!({"neutral": ["a"]})));
    assert_eq!(db.collection_history("system").expect("history").len(), 2);
}

#[test]
fn put_key_preserves_document_order_and_appends_new_keys() {
    let (db, _temp) = setup_temp_db();
    db.put_collection(
        "anotherDB",
        &docs(&[("zeta", json!(1)), ("alpha", json!(2))]),
    )
    .expect("put collection");
    db.put_key("anotherDB", "alpha", &json!(20)).expect("update");
    db.put_key("anotherDB", "mid", &json!(3)).expect("append");

    let documents = db.get_collection("anotherDB").expect("get");
    let keys: Vec<&String> = documents.keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    assert_eq!(documents.get("alpha"), Some(&json!(20)));
}

#[test]
fn put_key_into_missing_collection_is_not_found() {
    let (db, _temp) = setup_temp_db();
    let err = db
        .put_key("missing", "key", &json!({}))
        .expect_err("missing collection");
    assert!(matches!(err, AppError::NotFound));
}

#[test]
fn delete_guards_reserved_names() {
    let (db, _temp) = setup_temp_db();
    assert!(matches!(
        db.delete_collection("system"),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        db.delete_key("system", "publishinfo"),
        Err(AppError::BadRequest(_))
    ));
    assert!(db.get_collection("system").is_ok());
}

#[test]
fn delete_key_and_collection_record_history() {
    let (db, _temp) = setup_temp_db();
    db.put_collection("scratch", &docs(&[("a", json!(1)), ("b", json!(2))]))
        .expect("put");
    db.delete_key("scratch", "a").expect("delete key");
    assert_eq!(
        db.get_collection("scratch").expect("get").keys().collect::<Vec<_>>(),
        vec!["b"]
    );
    assert!(matches!(
        db.delete_key("scratch", "a"),
        Err(AppError::NotFound)
    ));

    db.delete_collection("scratch").expect("delete collection");
    assert!(matches!(
        db.get_collection("scratch"),
        Err(AppError::NotFound)
    ));

    let messages: Vec<String> = db
        .collection_history("scratch")
        .expect("history")
        .into_iter()
        .map(|record| record.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "Removed database [scratch]",
            "Removed key [a] from database [scratch]",
            "Added database [scratch]",
        ]
    );
}

#[test]
fn versions_chain_to_their_parent() {
    let (db, _temp) = setup_temp_db();
    db.put_key("system", "publishinfo", &json!({"buckets": ["prod"]}))
        .expect("update");
    let history = db.collection_history("system").expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].parent_ids, vec![history[1].version_id.clone()]);
    assert_eq!(history[0].version_id.len(), 40);
    assert_ne!(history[0].version_id, history[1].version_id);
    assert_eq!(
        history[0].message,
        "Setting key [publishinfo] in database [system]"
    );
}

#[test]
fn key_history_only_lists_versions_touching_the_key() {
    let (db, _temp) = setup_temp_db();
    db.put_key("system", "tags", &json!({})).expect("tags");
    db.put_key("system", "tags", &json!({"x": 1})).expect("tags again");

    let publish = db.get_key_history("system", "publishinfo").expect("history");
    assert_eq!(publish.len(), 1);
    let tags = db.get_key_history("system", "tags").expect("history");
    assert_eq!(tags.len(), 2);
}

#[test]
fn revert_restores_whole_snapshot_and_records_new_version() {
    let (db, _temp) = setup_temp_db();
    let original = db.get_collection("system").expect("system");
    let seed_version = db.collection_history("system").expect("history")[0]
        .version_id
        .clone();

    db.put_key("system", "somekey", &json!({"temp": true}))
        .expect("add key");
    db.put_key("system", "publishinfo", &json!({"changed": 1}))
        .expect("edit");

    db.revert_to_version("system", &seed_version).expect("revert");
    assert_eq!(db.get_collection("system").expect("system"), original);

    let history = db.collection_history("system").expect("history");
    assert_eq!(history.len(), 4);
    assert_eq!(
        history[0].message,
        format!("Reverted database [system] to version [{}]", seed_version)
    );
    let somekey_history = db.get_key_history("system", "somekey").expect("history");
    assert_eq!(somekey_history.len(), 2);
}

#[test]
fn revert_to_unknown_version_is_not_found() {
    let (db, _temp) = setup_temp_db();
    assert!(matches!(
        db.revert_to_version("system", "0000000000000000000000000000000000000000"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn shared_handles_see_each_others_writes() {
    let (db, _temp) = setup_temp_db();
    let shared = db.share();
    shared
        .put_collection("databaseCopy", &docs(&[("key", json!({}))]))
        .expect("put");
    assert_eq!(
        db.list_collections().expect("list"),
        vec!["databaseCopy", "system"]
    );
}
