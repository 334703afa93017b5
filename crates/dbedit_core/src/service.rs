//! Database service contract consumed by the editor backend worker.
//!
//! Calls are blocking; the editor runs them on its backend thread and never on
//! the state-machine side.

use crate::error::AppError;
use crate::models::{DocumentMap, VersionRecord};
use serde_json::Value;

/// Collection/key CRUD plus version operations.
pub trait DatabaseService {
    /// All collection names in store order.
    fn list_collections(&self) -> Result<Vec<String>, AppError>;

    /// Every document in `name`, in collection order.
    ///
    /// # Errors
    /// [`AppError::NotFound`] when the collection does not exist.
    fn get_collection(&self, name: &str) -> Result<DocumentMap, AppError>;

    /// Versions that touched `key` in `collection`, newest first.
    fn get_key_history(&self, collection: &str, key: &str)
        -> Result<Vec<VersionRecord>, AppError>;

    /// Create or replace a whole collection.
    fn put_collection(&self, name: &str, documents: &DocumentMap) -> Result<(), AppError>;

    /// Remove a collection.
    fn delete_collection(&self, name: &str) -> Result<(), AppError>;

    /// Create or replace one document.
    fn put_key(&self, collection: &str, key: &str, content: &Value) -> Result<(), AppError>;

    /// Remove one document.
    fn delete_key(&self, collection: &str, key: &str) -> Result<(), AppError>;

    /// Restore the whole collection to the snapshot recorded at `version_id`.
    fn revert_to_version(&self, collection: &str, version_id: &str) -> Result<(), AppError>;
}
