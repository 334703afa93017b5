//! Protocol types for the editor backend worker.

use crate::busy::OpKey;
use dbedit_core::models::{DocumentMap, VersionRecord};
use serde_json::Value;

/// Everything the worker needs to persist one save, renames included.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    /// Collection the edit started from.
    pub from_collection: String,
    /// Key the edit started from.
    pub from_key: String,
    /// Collection name entered by the user.
    pub to_collection: String,
    /// Key name entered by the user.
    pub to_key: String,
    /// Buffer content read at save time.
    pub content: Value,
    /// Loaded documents of `from_collection`, used when it is renamed.
    pub collection_documents: DocumentMap,
}

impl SavePlan {
    pub fn renames_collection(&self) -> bool {
        self.from_collection != self.to_collection
    }

    pub fn renames_key(&self) -> bool {
        self.from_key != self.to_key
    }
}

/// Commands issued by the session for the backend worker to execute.
#[derive(Debug)]
pub enum CoreCmd {
    /// Fetch the collection catalog.
    ListCollections,
    /// Fetch every document of one collection.
    LoadCollection { ticket: u64, name: String },
    /// Fetch the versions that touched one key.
    LoadKeyHistory {
        ticket: u64,
        collection: String,
        key: String,
    },
    /// Create (or fork into) a new collection with the given documents.
    CreateCollection {
        op: OpKey,
        name: String,
        documents: DocumentMap,
    },
    DeleteCollection { op: OpKey, name: String },
    /// Create or overwrite one document.
    PutKey {
        op: OpKey,
        collection: String,
        key: String,
        content: Value,
    },
    DeleteKey {
        op: OpKey,
        collection: String,
        key: String,
    },
    /// Persist an edit, applying collection/key renames first.
    SaveDocument { op: OpKey, plan: SavePlan },
    /// Revert a collection and return its restored documents.
    RevertToVersion {
        op: OpKey,
        collection: String,
        version_id: String,
        previous_key: Option<String>,
    },
}

/// Which request a backend failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreErrorSource {
    Catalog,
    Collection { ticket: u64, name: String },
    History { ticket: u64 },
    Action(OpKey),
}

/// Events produced by the backend worker and polled by the session.
#[derive(Debug)]
pub enum CoreEvent {
    CollectionsListed { names: Vec<String> },
    CollectionLoaded {
        ticket: u64,
        name: String,
        documents: DocumentMap,
    },
    KeyHistoryLoaded {
        ticket: u64,
        collection: String,
        key: String,
        versions: Vec<VersionRecord>,
    },
    CollectionCreated {
        op: OpKey,
        name: String,
        documents: DocumentMap,
    },
    CollectionDeleted { op: OpKey, name: String },
    KeyPut {
        op: OpKey,
        collection: String,
        key: String,
        content: Value,
    },
    KeyDeleted {
        op: OpKey,
        collection: String,
        key: String,
    },
    DocumentSaved { op: OpKey, plan: SavePlan },
    /// Revert succeeded; `documents` is the collection as refetched afterwards.
    VersionRestored {
        op: OpKey,
        collection: String,
        version_id: String,
        documents: DocumentMap,
        previous_key: Option<String>,
    },
    /// A backend failure occurred (storage error, missing entity, etc).
    Error {
        source: CoreErrorSource,
        message: String,
    },
}
