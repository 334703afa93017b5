//! Selection and navigation state: catalog, active collection, active key.
//!
//! The state never talks to the backend itself. The session asks it what to
//! load, feeds responses back in, and reads the projections for rendering.

use dbedit_core::models::{Collection, DocumentMap};
use serde_json::Value;
use tracing::debug;

/// Progress of the collection catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    Loading,
    Ready,
    /// The store returned zero collections.
    MissingDatabase,
}

/// Persistent "nothing to show" condition, distinct from loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    MissingDatabase,
    MissingKey,
}

impl NoDataReason {
    /// Message shown in place of the editor.
    pub fn message(self) -> &'static str {
        match self {
            NoDataReason::MissingDatabase => "No data found! Missing database.",
            NoDataReason::MissingKey => "No data found! Missing key.",
        }
    }
}

/// Result of feeding a collection response into the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Response was for a superseded request and was dropped.
    Stale,
    /// Collection has no documents; nothing selected.
    Empty,
    /// This key is now selected.
    Selected(String),
}

/// Key to select after a restore: the previous key if it survived, otherwise
/// the first restored key.
pub fn reconcile_key(previous_key: Option<&str>, documents: &DocumentMap) -> Option<String> {
    match previous_key {
        Some(key) if documents.contains_key(key) => Some(key.to_string()),
        _ => documents.keys().next().cloned(),
    }
}

#[derive(Debug)]
pub struct SelectionState {
    catalog: CatalogStatus,
    collection_names: Vec<String>,
    selected_collection: Option<String>,
    selected_key: Option<String>,
    loaded: Option<Collection>,
    requested_key: Option<String>,
    load_ticket: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            catalog: CatalogStatus::Loading,
            collection_names: Vec::new(),
            selected_collection: None,
            selected_key: None,
            loaded: None,
            requested_key: None,
            load_ticket: 0,
        }
    }
}

impl SelectionState {
    /// Apply a catalog listing.
    ///
    /// # Returns
    /// The collection that should be loaded next: the current selection when
    /// it still exists, otherwise the first listed name. `None` when the
    /// catalog is empty.
    pub fn apply_catalog(&mut self, names: Vec<String>) -> Option<String> {
        self.collection_names = names;
        if self.collection_names.is_empty() {
            self.catalog = CatalogStatus::MissingDatabase;
            self.clear_collection();
            return None;
        }
        self.catalog = CatalogStatus::Ready;
        let keep = self
            .selected_collection
            .as_ref()
            .filter(|name| self.collection_names.contains(name))
            .cloned();
        if keep.is_none() {
            self.clear_collection();
        }
        keep.or_else(|| self.collection_names.first().cloned())
    }

    fn clear_collection(&mut self) {
        self.selected_collection = None;
        self.selected_key = None;
        self.loaded = None;
        self.requested_key = None;
    }

    /// Select `name` and start a fetch of its documents.
    ///
    /// `requested_key` is selected when the response contains it; otherwise
    /// the first key is.
    ///
    /// # Returns
    /// The ticket the matching response must carry, or `None` when `name` is
    /// not in the catalog.
    pub fn begin_collection_load(
        &mut self,
        name: &str,
        requested_key: Option<String>,
    ) -> Option<u64> {
        if !self.collection_names.iter().any(|known| known == name) {
            return None;
        }
        self.load_ticket = self.load_ticket.wrapping_add(1);
        self.selected_collection = Some(name.to_string());
        self.selected_key = None;
        self.loaded = None;
        self.requested_key = requested_key;
        Some(self.load_ticket)
    }

    /// Ticket of the newest collection fetch.
    pub fn load_ticket(&self) -> u64 {
        self.load_ticket
    }

    /// Feed a collection response.
    pub fn apply_collection(
        &mut self,
        ticket: u64,
        name: &str,
        documents: DocumentMap,
    ) -> CollectionOutcome {
        if ticket != self.load_ticket || self.selected_collection.as_deref() != Some(name) {
            debug!(
                collection = name,
                ticket,
                live = self.load_ticket,
                "dropping stale collection response"
            );
            return CollectionOutcome::Stale;
        }
        let requested = self.requested_key.take();
        self.install(name, documents, requested.as_deref())
    }

    fn install(
        &mut self,
        name: &str,
        documents: DocumentMap,
        preferred_key: Option<&str>,
    ) -> CollectionOutcome {
        let key = reconcile_key(preferred_key, &documents);
        self.loaded = Some(Collection::new(name, documents));
        self.selected_key = key.clone();
        match key {
            Some(key) => CollectionOutcome::Selected(key),
            None => CollectionOutcome::Empty,
        }
    }

    /// Select a key of the loaded collection.
    ///
    /// # Returns
    /// `true` when the selection changed. Selecting the current key, or a key
    /// that does not exist, changes nothing.
    pub fn select_key(&mut self, key: &str) -> bool {
        let exists = self
            .loaded
            .as_ref()
            .is_some_and(|collection| collection.documents.contains_key(key));
        if !exists || self.selected_key.as_deref() == Some(key) {
            return false;
        }
        self.selected_key = Some(key.to_string());
        true
    }

    /// Replace the loaded documents after a restore and reconcile the key.
    ///
    /// # Returns
    /// The key now selected, or `None` when the restored collection is empty.
    pub fn reconcile_after_restore(
        &mut self,
        collection: &str,
        previous_key: Option<&str>,
        documents: DocumentMap,
    ) -> Option<String> {
        self.load_ticket = self.load_ticket.wrapping_add(1);
        self.selected_collection = Some(collection.to_string());
        self.requested_key = None;
        match self.install(collection, documents, previous_key) {
            CollectionOutcome::Selected(key) => Some(key),
            _ => None,
        }
    }

    /// Add a collection to the catalog and select it with its documents.
    pub fn insert_collection(&mut self, name: &str, documents: DocumentMap) -> Option<String> {
        self.insert_name(name);
        self.catalog = CatalogStatus::Ready;
        self.load_ticket = self.load_ticket.wrapping_add(1);
        self.selected_collection = Some(name.to_string());
        self.requested_key = None;
        match self.install(name, documents, None) {
            CollectionOutcome::Selected(key) => Some(key),
            _ => None,
        }
    }

    /// Remove a collection from the catalog.
    ///
    /// # Returns
    /// The collection to load next when the removed one was selected.
    pub fn remove_collection(&mut self, name: &str) -> Option<String> {
        self.collection_names.retain(|known| known != name);
        if self.collection_names.is_empty() {
            self.catalog = CatalogStatus::MissingDatabase;
        }
        if self.selected_collection.as_deref() != Some(name) {
            return None;
        }
        self.clear_collection();
        self.collection_names.first().cloned()
    }

    /// Rename a collection in the catalog, moving it to its sorted position.
    pub fn rename_collection(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.collection_names.retain(|known| known != from);
        self.insert_name(to);
        if self.selected_collection.as_deref() == Some(from) {
            self.selected_collection = Some(to.to_string());
            if let Some(loaded) = self.loaded.as_mut() {
                loaded.name = to.to_string();
            }
        }
    }

    /// Insert or update a document of the loaded collection.
    ///
    /// Ignored when `collection` is not the loaded one.
    pub fn upsert_document(&mut self, collection: &str, key: &str, content: Value) {
        if let Some(loaded) = self.loaded_mut(collection) {
            loaded.documents.insert(key.to_string(), content);
        }
    }

    /// Remove a document from the loaded collection.
    ///
    /// # Returns
    /// The newly selected key when the removed one was selected.
    pub fn remove_document(&mut self, collection: &str, key: &str) -> Option<String> {
        let loaded = self.loaded_mut(collection)?;
        loaded.documents.shift_remove(key);
        let first = loaded.first_key().map(str::to_string);
        if self.selected_key.as_deref() != Some(key) {
            return None;
        }
        self.selected_key = first.clone();
        first
    }

    /// Insert `name` before the first greater name, matching the store's
    /// sorted listing.
    fn insert_name(&mut self, name: &str) {
        if self.collection_names.iter().any(|known| known == name) {
            return;
        }
        let index = self
            .collection_names
            .iter()
            .position(|known| known.as_str() > name)
            .unwrap_or(self.collection_names.len());
        self.collection_names.insert(index, name.to_string());
    }

    /// Make `key` the selected key without the existence check.
    pub(crate) fn force_key(&mut self, key: Option<String>) {
        self.selected_key = key;
    }

    fn loaded_mut(&mut self, collection: &str) -> Option<&mut Collection> {
        self.loaded
            .as_mut()
            .filter(|loaded| loaded.name == collection)
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.catalog
    }

    pub fn collection_names(&self) -> &[String] {
        &self.collection_names
    }

    pub fn selected_collection(&self) -> Option<&str> {
        self.selected_collection.as_deref()
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    /// The loaded collection, once its fetch completed.
    pub fn loaded(&self) -> Option<&Collection> {
        self.loaded.as_ref()
    }

    /// Whether the selected collection's documents are still being fetched.
    pub fn is_collection_loading(&self) -> bool {
        self.selected_collection.is_some() && self.loaded.is_none()
    }

    /// Key names of the loaded collection, in collection order.
    pub fn key_names(&self) -> Vec<String> {
        self.loaded
            .as_ref()
            .map(Collection::key_names)
            .unwrap_or_default()
    }

    /// Content of the selected key.
    pub fn selected_content(&self) -> Option<&Value> {
        let key = self.selected_key.as_deref()?;
        self.loaded.as_ref()?.documents.get(key)
    }

    pub fn selected_collection_index(&self) -> Option<usize> {
        let selected = self.selected_collection.as_deref()?;
        self.collection_names
            .iter()
            .position(|name| name == selected)
    }

    pub fn selected_key_index(&self) -> Option<usize> {
        let selected = self.selected_key.as_deref()?;
        self.loaded
            .as_ref()?
            .documents
            .keys()
            .position(|name| name == selected)
    }

    /// Current no-data condition, if any.
    pub fn no_data(&self) -> Option<NoDataReason> {
        if self.catalog == CatalogStatus::MissingDatabase {
            return Some(NoDataReason::MissingDatabase);
        }
        match self.loaded.as_ref() {
            Some(collection) if collection.documents.is_empty() => Some(NoDataReason::MissingKey),
            _ => None,
        }
    }
}
