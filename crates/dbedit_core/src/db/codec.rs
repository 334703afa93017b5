//! Row encodings for collections and versions.

use crate::error::AppError;
use crate::models::{DocumentMap, VersionRecord};
use serde::{Deserialize, Serialize};

/// Persisted collection body.
///
/// JSON values are stored as text because bincode cannot round-trip
/// self-describing `serde_json::Value`s. Pair order is document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredCollection {
    pub(crate) documents: Vec<(String, String)>,
}

/// Persisted version row: the public record plus what it changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredVersion {
    pub(crate) record: VersionRecord,
    pub(crate) touched_keys: Vec<String>,
    /// Collection body after this version; `None` when the version removed it.
    pub(crate) snapshot: Option<StoredCollection>,
}

impl StoredCollection {
    pub(crate) fn from_documents(documents: &DocumentMap) -> Result<Self, AppError> {
        let mut pairs = Vec::with_capacity(documents.len());
        for (key, value) in documents {
            pairs.push((key.clone(), serde_json::to_string(value)?));
        }
        Ok(Self { documents: pairs })
    }

    pub(crate) fn to_documents(&self) -> Result<DocumentMap, AppError> {
        let mut documents = DocumentMap::new();
        for (key, text) in &self.documents {
            documents.insert(key.clone(), serde_json::from_str(text)?);
        }
        Ok(documents)
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.documents.iter().position(|(name, _)| name == key)
    }

    /// Replace `key` in place, or append it when new.
    pub(crate) fn upsert(&mut self, key: &str, text: String) {
        match self.position(key) {
            Some(idx) => self.documents[idx].1 = text,
            None => self.documents.push((key.to_string(), text)),
        }
    }

    /// Remove `key`, keeping the order of the remaining documents.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(idx) => {
                self.documents.remove(idx);
                true
            }
            None => false,
        }
    }

    fn value_of(&self, key: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, text)| text.as_str())
    }
}

/// Keys whose content differs between two collection bodies.
///
/// Keys present in `after` come first in `after` order, then keys that only
/// existed in `before`.
pub(crate) fn touched_keys(before: &StoredCollection, after: &StoredCollection) -> Vec<String> {
    let mut touched: Vec<String> = after
        .documents
        .iter()
        .filter(|(key, text)| before.value_of(key) != Some(text.as_str()))
        .map(|(key, _)| key.clone())
        .collect();
    touched.extend(
        before
            .documents
            .iter()
            .filter(|(key, _)| after.position(key).is_none())
            .map(|(key, _)| key.clone()),
    );
    touched
}

pub(crate) fn decode_collection(bytes: &[u8]) -> Result<StoredCollection, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn decode_version(bytes: &[u8]) -> Result<StoredVersion, AppError> {
    Ok(bincode::deserialize(bytes)?)
}
