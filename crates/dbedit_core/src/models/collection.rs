//! Collection ("database") and document ("key") models.

use crate::constants::{RESERVED_COLLECTION, RESERVED_DOCUMENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered mapping from document name to JSON content.
///
/// Iteration order is the order the store returned the documents in, which is
/// what "first key" means throughout the editor.
pub type DocumentMap = serde_json::Map<String, Value>;

/// A named JSON value owned by exactly one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: Value,
}

/// A named group of documents, fetched/forked/created/deleted as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub documents: DocumentMap,
}

impl Collection {
    /// Build a collection from its name and ordered documents.
    pub fn new(name: impl Into<String>, documents: DocumentMap) -> Self {
        Self {
            name: name.into(),
            documents,
        }
    }

    /// Whether this is the reserved system collection.
    pub fn is_reserved(&self) -> bool {
        self.name == RESERVED_COLLECTION
    }

    /// Document names in collection order.
    pub fn key_names(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Name of the first document, if any.
    pub fn first_key(&self) -> Option<&str> {
        self.documents.keys().next().map(String::as_str)
    }

    /// Look up one document by name.
    pub fn document(&self, key: &str) -> Option<Document> {
        self.documents.get(key).map(|content| Document {
            name: key.to_string(),
            content: content.clone(),
        })
    }

    /// Whether `key` is the reserved document of this collection.
    pub fn is_reserved_document(&self, key: &str) -> bool {
        self.is_reserved() && key == RESERVED_DOCUMENT
    }
}
