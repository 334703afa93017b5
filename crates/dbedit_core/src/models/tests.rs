//! Model-level unit tests.

use super::*;
use chrono::Utc;
use serde_json::json;

fn collection(name: &str, keys: &[&str]) -> Collection {
    let mut documents = DocumentMap::new();
    for key in keys {
        documents.insert((*key).to_string(), json!({}));
    }
    Collection::new(name, documents)
}

#[test]
fn document_order_is_preserved() {
    let coll = collection("anotherDB", &["zeta", "alpha", "mid"]);
    assert_eq!(coll.key_names(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(coll.first_key(), Some("zeta"));
}

#[test]
fn reserved_document_only_inside_reserved_collection() {
    let system = collection("system", &["publishinfo", "tags"]);
    assert!(system.is_reserved());
    assert!(system.is_reserved_document("publishinfo"));
    assert!(!system.is_reserved_document("tags"));

    let other = collection("databaseCopy", &["publishinfo"]);
    assert!(!other.is_reserved());
    assert!(!other.is_reserved_document("publishinfo"));
}

#[test]
fn empty_collection_has_no_first_key() {
    let coll = collection("empty", &[]);
    assert!(coll.first_key().is_none());
    assert!(coll.document("missing").is_none());
}

#[test]
fn short_id_truncates_long_version_ids() {
    let record = VersionRecord {
        version_id: "b104d3dd17f790b75c4e067c44bb06b914902d78".to_string(),
        timestamp: Utc::now(),
        author: "dbedit".to_string(),
        email: "dbedit@localhost".to_string(),
        message: "Setting key [publishinfo] in database [system]".to_string(),
        parent_ids: vec!["ff59eb0e6d230c077dfa503c9f2d4aacec1b72ab".to_string()],
    };
    assert_eq!(record.short_id(), "b104d3dd");
}
