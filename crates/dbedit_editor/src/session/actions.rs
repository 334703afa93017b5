//! User-triggered actions: busy check, guard, then one backend command.

use super::{ActionError, DownloadPayload, EditorSession, RestoreRequest};
use crate::backend::{CoreCmd, SavePlan};
use crate::busy::{OpKey, OpKind};
use dbedit_core::constants::DOWNLOAD_FILE_TYPE;
use dbedit_core::guard::{
    can_save, check_collection_delete, check_document_delete, check_new_collection_name,
    check_new_key_name, is_collection_deletable, is_document_deletable, siblings_excluding,
    Rejection, SaveCandidate,
};
use dbedit_core::models::DocumentMap;
use dbedit_core::{
    FORK_NAME_PREFIX, NEW_COLLECTION_NAME, NEW_COLLECTION_SEED_KEY, NEW_DOCUMENT_NAME,
};
use serde_json::{json, Value};
use tracing::{info, warn};

fn fork_name(source: &str) -> String {
    format!("{}{}", FORK_NAME_PREFIX, source)
}

fn rejection_detail(rejection: &Rejection) -> String {
    match rejection {
        Rejection::InvalidJson(message) => message.clone(),
        other => other.to_string(),
    }
}

impl EditorSession {
    /// Create `new database` holding one empty document `key`, then select it.
    ///
    /// # Errors
    /// [`ActionError::Busy`] while a create is in flight, or a duplicate-name
    /// rejection when `new database` already exists.
    pub fn create_collection(&mut self) -> Result<(), ActionError> {
        let op = OpKey::new(OpKind::CreateCollection, NEW_COLLECTION_NAME);
        self.ensure_idle(&op)?;
        let checked =
            check_new_collection_name(NEW_COLLECTION_NAME, self.selection.collection_names());
        self.guard(checked)?;
        let mut documents = DocumentMap::new();
        documents.insert(NEW_COLLECTION_SEED_KEY.to_string(), json!({}));
        let cmd = CoreCmd::CreateCollection {
            op: op.clone(),
            name: NEW_COLLECTION_NAME.to_string(),
            documents,
        };
        self.dispatch(op, cmd)
    }

    /// Copy the loaded collection into `copy of <name>`.
    pub fn fork_collection(&mut self) -> Result<(), ActionError> {
        let Some(source) = self.selection.loaded().map(|loaded| loaded.name.clone()) else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        let op = OpKey::new(OpKind::ForkCollection, source.as_str());
        self.ensure_idle(&op)?;
        let name = fork_name(&source);
        let checked = check_new_collection_name(&name, self.selection.collection_names());
        self.guard(checked)?;
        let documents = self
            .selection
            .loaded()
            .map(|loaded| loaded.documents.clone())
            .unwrap_or_default();
        let cmd = CoreCmd::CreateCollection {
            op: op.clone(),
            name,
            documents,
        };
        self.dispatch(op, cmd)
    }

    /// Delete the selected collection.
    ///
    /// The reserved collection is refused before anything is sent.
    pub fn delete_collection(&mut self) -> Result<(), ActionError> {
        let Some(name) = self.selection.selected_collection().map(str::to_string) else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        let op = OpKey::new(OpKind::DeleteCollection, name.as_str());
        self.ensure_idle(&op)?;
        self.guard(check_collection_delete(&name))?;
        let cmd = CoreCmd::DeleteCollection {
            op: op.clone(),
            name,
        };
        self.dispatch(op, cmd)
    }

    /// Add an empty `new key` document to the loaded collection.
    pub fn create_key(&mut self) -> Result<(), ActionError> {
        let Some(collection) = self.selection.loaded().map(|loaded| loaded.name.clone()) else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        let op = OpKey::new(OpKind::CreateKey, collection.as_str());
        self.ensure_idle(&op)?;
        let checked = check_new_key_name(NEW_DOCUMENT_NAME, &self.selection.key_names());
        self.guard(checked)?;
        let cmd = CoreCmd::PutKey {
            op: op.clone(),
            collection,
            key: NEW_DOCUMENT_NAME.to_string(),
            content: json!({}),
        };
        self.dispatch(op, cmd)
    }

    /// Copy the selected key, with the current buffer content, to
    /// `copy of <key>`.
    pub fn fork_key(&mut self) -> Result<(), ActionError> {
        let (collection, key) = self.selected_identity()?;
        let op = OpKey::for_key(OpKind::ForkKey, &collection, &key);
        self.ensure_idle(&op)?;
        let name = fork_name(&key);
        let checked = check_new_key_name(&name, &self.selection.key_names());
        self.guard(checked)?;
        let content = match self.buffer.get() {
            Ok(content) => content,
            Err(rejection) => return Err(self.reject(rejection.into())),
        };
        let cmd = CoreCmd::PutKey {
            op: op.clone(),
            collection,
            key: name,
            content,
        };
        self.dispatch(op, cmd)
    }

    /// Delete the selected key.
    ///
    /// `system/publishinfo` is refused before anything is sent.
    pub fn delete_key(&mut self) -> Result<(), ActionError> {
        let (collection, key) = self.selected_identity()?;
        let op = OpKey::for_key(OpKind::DeleteKey, &collection, &key);
        self.ensure_idle(&op)?;
        self.guard(check_document_delete(&collection, &key))?;
        let cmd = CoreCmd::DeleteKey {
            op: op.clone(),
            collection,
            key,
        };
        self.dispatch(op, cmd)
    }

    /// Persist the buffer under the edited collection and key names.
    ///
    /// # Errors
    /// The first failing guard rule (collection name, key name, JSON), or a
    /// reserved rejection when the edit would rename `system` or
    /// `system/publishinfo` away.
    pub fn save(&mut self) -> Result<(), ActionError> {
        let (from_collection, from_key) = self.selected_identity()?;
        let op = OpKey::for_key(OpKind::Save, &from_collection, &from_key);
        self.ensure_idle(&op)?;

        let to_collection = self.edit_collection_name.clone();
        let to_key = self.edit_key_name.clone();
        let sibling_collections = siblings_excluding(
            self.selection.collection_names(),
            Some(from_collection.as_str()),
        );
        let key_names = self.selection.key_names();
        let sibling_keys = siblings_excluding(&key_names, Some(from_key.as_str()));
        let parsed = self.buffer.get();
        let parse_error = parsed.as_ref().err().map(rejection_detail);
        let document = match (&parsed, &parse_error) {
            (Ok(value), _) => Ok(value),
            (Err(_), Some(message)) => Err(message.as_str()),
            (Err(_), None) => Err(""),
        };
        let checked = can_save(&SaveCandidate {
            collection_name: &to_collection,
            key_name: &to_key,
            sibling_collections: &sibling_collections,
            sibling_keys: &sibling_keys,
            document,
        });
        self.guard(checked)?;

        if from_collection != to_collection && !is_collection_deletable(&from_collection) {
            return Err(self.reject(Rejection::ReservedCollection(from_collection).into()));
        }
        if from_key != to_key && !is_document_deletable(&from_collection, &from_key) {
            return Err(self.reject(
                Rejection::ReservedDocument {
                    collection: from_collection,
                    key: from_key,
                }
                .into(),
            ));
        }

        let content = match parsed {
            Ok(content) => content,
            Err(rejection) => return Err(self.reject(rejection.into())),
        };
        let collection_documents = if from_collection != to_collection {
            self.selection
                .loaded()
                .map(|loaded| loaded.documents.clone())
                .unwrap_or_default()
        } else {
            DocumentMap::new()
        };
        let plan = SavePlan {
            from_collection,
            from_key,
            to_collection,
            to_key,
            content,
            collection_documents,
        };
        let cmd = CoreCmd::SaveDocument {
            op: op.clone(),
            plan,
        };
        self.dispatch(op, cmd)
    }

    /// Revert the selected collection to `request.version_id`.
    pub fn restore(&mut self, request: RestoreRequest) -> Result<(), ActionError> {
        let Some(collection) = self.selection.selected_collection().map(str::to_string) else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        let op = OpKey::new(OpKind::Restore, collection.as_str());
        self.ensure_idle(&op)?;
        let cmd = CoreCmd::RevertToVersion {
            op: op.clone(),
            collection,
            version_id: request.version_id,
            previous_key: self.selection.selected_key().map(str::to_string),
        };
        self.dispatch(op, cmd)
    }

    /// The loaded collection as a downloadable JSON object.
    pub fn download_collection(&mut self) -> Result<DownloadPayload, ActionError> {
        let Some(loaded) = self.selection.loaded() else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        Ok(DownloadPayload {
            file_name: loaded.name.clone(),
            file_type: DOWNLOAD_FILE_TYPE,
            data: Value::Object(loaded.documents.clone()),
        })
    }

    /// The selected key's stored content as a downloadable JSON value.
    pub fn download_key(&mut self) -> Result<DownloadPayload, ActionError> {
        let (_, key) = self.selected_identity()?;
        let Some(content) = self.selection.selected_content().cloned() else {
            return Err(self.reject(ActionError::NoKeySelected));
        };
        Ok(DownloadPayload {
            file_name: key,
            file_type: DOWNLOAD_FILE_TYPE,
            data: content,
        })
    }

    fn selected_identity(&mut self) -> Result<(String, String), ActionError> {
        let Some(collection) = self.selection.selected_collection().map(str::to_string) else {
            return Err(self.reject(ActionError::NoCollectionSelected));
        };
        let Some(key) = self.selection.selected_key().map(str::to_string) else {
            return Err(self.reject(ActionError::NoKeySelected));
        };
        Ok((collection, key))
    }

    fn ensure_idle(&mut self, op: &OpKey) -> Result<(), ActionError> {
        if self.busy.is_busy(op) {
            return Err(self.reject(ActionError::Busy(op.clone())));
        }
        Ok(())
    }

    fn guard(&mut self, checked: Result<(), Rejection>) -> Result<(), ActionError> {
        checked.map_err(|rejection| self.reject(rejection.into()))
    }

    fn dispatch(&mut self, op: OpKey, cmd: CoreCmd) -> Result<(), ActionError> {
        if !self.busy.begin(op.clone()) {
            return Err(self.reject(ActionError::Busy(op)));
        }
        if self.backend.cmd_tx.send(cmd).is_err() {
            warn!("backend unavailable; {} not sent", op);
            self.busy.finish(&op);
            return Err(self.reject(ActionError::BackendUnavailable));
        }
        info!("{} started", op);
        self.last_rejection = None;
        Ok(())
    }
}
