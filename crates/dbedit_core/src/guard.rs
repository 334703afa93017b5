//! Name, uniqueness, and deletion guard rules.
//!
//! Every predicate here is pure: no storage access, no clocks. The editor
//! session consults them before issuing any mutating request, and the store
//! re-checks the deletion guards so the CLI gets the same protection.

use crate::constants::{RESERVED_COLLECTION, RESERVED_DOCUMENT};
use serde_json::Value;
use thiserror::Error;

/// Reason a mutating action was refused before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Collection name cannot be empty")]
    EmptyCollectionName,
    #[error("Collection '{0}' already exists")]
    DuplicateCollectionName(String),
    #[error("Key name cannot be empty")]
    EmptyKeyName,
    #[error("Key '{0}' already exists in this collection")]
    DuplicateKeyName(String),
    #[error("Document is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Collection '{0}' is reserved and cannot be deleted")]
    ReservedCollection(String),
    #[error("Key '{key}' in collection '{collection}' is reserved and cannot be deleted")]
    ReservedDocument { collection: String, key: String },
}

/// Whether `name` is usable as a collection or key name.
///
/// Only the exact empty string is rejected; whitespace is not trimmed.
pub fn is_name_valid(name: &str) -> bool {
    !name.is_empty()
}

/// Whether `name` does not collide with any of `siblings`.
///
/// `siblings` must already exclude the entity being renamed. Comparison is
/// case-sensitive.
pub fn is_name_unique<S: AsRef<str>>(name: &str, siblings: &[S]) -> bool {
    !siblings.iter().any(|sibling| sibling.as_ref() == name)
}

/// Whether a collection may be deleted.
pub fn is_collection_deletable(name: &str) -> bool {
    name != RESERVED_COLLECTION
}

/// Whether a document may be deleted from a collection.
pub fn is_document_deletable(collection: &str, key: &str) -> bool {
    !(collection == RESERVED_COLLECTION && key == RESERVED_DOCUMENT)
}

/// Collect `names` minus `origin`, the sibling set used for rename checks.
pub fn siblings_excluding<'a, I>(names: I, origin: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .filter(|name| Some(name.as_str()) != origin)
        .cloned()
        .collect()
}

/// Guard-level check for a new collection name (create/fork).
pub fn check_new_collection_name<S: AsRef<str>>(
    name: &str,
    existing: &[S],
) -> Result<(), Rejection> {
    if !is_name_valid(name) {
        return Err(Rejection::EmptyCollectionName);
    }
    if !is_name_unique(name, existing) {
        return Err(Rejection::DuplicateCollectionName(name.to_string()));
    }
    Ok(())
}

/// Guard-level check for a new key name (create/fork) inside one collection.
pub fn check_new_key_name<S: AsRef<str>>(name: &str, existing: &[S]) -> Result<(), Rejection> {
    if !is_name_valid(name) {
        return Err(Rejection::EmptyKeyName);
    }
    if !is_name_unique(name, existing) {
        return Err(Rejection::DuplicateKeyName(name.to_string()));
    }
    Ok(())
}

/// Guard-level check before a collection delete request.
pub fn check_collection_delete(name: &str) -> Result<(), Rejection> {
    if is_collection_deletable(name) {
        Ok(())
    } else {
        Err(Rejection::ReservedCollection(name.to_string()))
    }
}

/// Guard-level check before a document delete request.
pub fn check_document_delete(collection: &str, key: &str) -> Result<(), Rejection> {
    if is_document_deletable(collection, key) {
        Ok(())
    } else {
        Err(Rejection::ReservedDocument {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }
}

/// Inputs for [`can_save`].
///
/// The sibling lists exclude the identities being saved: `sibling_collections`
/// omits the collection the edit started from, and `sibling_keys` omits the
/// key the edit started from (within the destination collection).
#[derive(Debug, Clone, Copy)]
pub struct SaveCandidate<'a> {
    pub collection_name: &'a str,
    pub key_name: &'a str,
    pub sibling_collections: &'a [String],
    pub sibling_keys: &'a [String],
    /// Parsed buffer content, or the parse error message in plain-text mode.
    pub document: Result<&'a Value, &'a str>,
}

/// Decide whether a save (possibly renaming collection and key) may proceed.
///
/// # Returns
/// `Ok(())` when allowed.
///
/// # Errors
/// The first failing rule, in order: collection name, key name, document JSON.
pub fn can_save(candidate: &SaveCandidate<'_>) -> Result<(), Rejection> {
    check_new_collection_name(candidate.collection_name, candidate.sibling_collections)?;
    check_new_key_name(candidate.key_name, candidate.sibling_keys)?;
    if let Err(message) = candidate.document {
        return Err(Rejection::InvalidJson(message.to_string()));
    }
    Ok(())
}
