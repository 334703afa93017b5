//! Background worker thread for store access.

use crate::backend::{CoreCmd, CoreErrorSource, CoreEvent, SavePlan};
use crate::busy::OpKey;
use crossbeam_channel::{unbounded, Receiver, Sender};
use dbedit_core::config::env_flag_enabled;
use dbedit_core::models::DocumentMap;
use dbedit_core::{AppError, DatabaseService};
use std::thread;
use std::time::Instant;
use tracing::{error, info};

/// Handle for sending commands to, and receiving events from, the backend worker.
pub struct BackendHandle {
    pub cmd_tx: Sender<CoreCmd>,
    pub evt_rx: Receiver<CoreEvent>,
}

impl BackendHandle {
    /// Wrap pre-built channels; tests drive the session without a worker.
    pub fn from_test_channels(cmd_tx: Sender<CoreCmd>, evt_rx: Receiver<CoreEvent>) -> Self {
        Self { cmd_tx, evt_rx }
    }
}

struct WorkerState<S> {
    service: S,
    evt_tx: Sender<CoreEvent>,
}

impl<S: DatabaseService> WorkerState<S> {
    fn send(&self, event: CoreEvent) {
        let _ = self.evt_tx.send(event);
    }

    fn fail(&self, source: CoreErrorSource, message: String) {
        self.send(CoreEvent::Error { source, message });
    }

    fn fail_action(&self, op: OpKey, err: AppError) {
        error!("backend {} failed: {}", op, err);
        let message = format!("{} failed: {}", op, err);
        self.fail(CoreErrorSource::Action(op), message);
    }

    fn handle(&self, cmd: CoreCmd) {
        match cmd {
            CoreCmd::ListCollections => match self.service.list_collections() {
                Ok(names) => self.send(CoreEvent::CollectionsListed { names }),
                Err(err) => {
                    error!("backend list failed: {}", err);
                    self.fail(CoreErrorSource::Catalog, format!("List failed: {}", err));
                }
            },
            CoreCmd::LoadCollection { ticket, name } => match self.service.get_collection(&name) {
                Ok(documents) => self.send(CoreEvent::CollectionLoaded {
                    ticket,
                    name,
                    documents,
                }),
                Err(err) => {
                    error!("backend load of database [{}] failed: {}", name, err);
                    let message = format!("Load database [{}] failed: {}", name, err);
                    self.fail(CoreErrorSource::Collection { ticket, name }, message);
                }
            },
            CoreCmd::LoadKeyHistory {
                ticket,
                collection,
                key,
            } => match self.service.get_key_history(&collection, &key) {
                Ok(versions) => self.send(CoreEvent::KeyHistoryLoaded {
                    ticket,
                    collection,
                    key,
                    versions,
                }),
                Err(err) => {
                    error!("backend history of [{}/{}] failed: {}", collection, key, err);
                    self.fail(
                        CoreErrorSource::History { ticket },
                        format!("History failed: {}", err),
                    );
                }
            },
            CoreCmd::CreateCollection {
                op,
                name,
                documents,
            } => match self.create_collection(&name, &documents) {
                Ok(()) => self.send(CoreEvent::CollectionCreated {
                    op,
                    name,
                    documents,
                }),
                Err(err) => self.fail_action(op, err),
            },
            CoreCmd::DeleteCollection { op, name } => {
                match self.service.delete_collection(&name) {
                    Ok(()) => self.send(CoreEvent::CollectionDeleted { op, name }),
                    Err(err) => self.fail_action(op, err),
                }
            }
            CoreCmd::PutKey {
                op,
                collection,
                key,
                content,
            } => match self.service.put_key(&collection, &key, &content) {
                Ok(()) => self.send(CoreEvent::KeyPut {
                    op,
                    collection,
                    key,
                    content,
                }),
                Err(err) => self.fail_action(op, err),
            },
            CoreCmd::DeleteKey {
                op,
                collection,
                key,
            } => match self.service.delete_key(&collection, &key) {
                Ok(()) => self.send(CoreEvent::KeyDeleted {
                    op,
                    collection,
                    key,
                }),
                Err(err) => self.fail_action(op, err),
            },
            CoreCmd::SaveDocument { op, plan } => match self.save_document(&plan) {
                Ok(()) => self.send(CoreEvent::DocumentSaved { op, plan }),
                Err(err) => self.fail_action(op, err),
            },
            CoreCmd::RevertToVersion {
                op,
                collection,
                version_id,
                previous_key,
            } => match self.revert(&collection, &version_id) {
                Ok(documents) => self.send(CoreEvent::VersionRestored {
                    op,
                    collection,
                    version_id,
                    documents,
                    previous_key,
                }),
                Err(err) => self.fail_action(op, err),
            },
        }
    }

    fn create_collection(&self, name: &str, documents: &DocumentMap) -> Result<(), AppError> {
        if self.service.list_collections()?.iter().any(|known| known == name) {
            return Err(AppError::BadRequest(format!(
                "database [{}] already exists",
                name
            )));
        }
        self.service.put_collection(name, documents)
    }

    // Calls run in order; a failure part-way leaves earlier calls applied.
    fn save_document(&self, plan: &SavePlan) -> Result<(), AppError> {
        if plan.renames_collection() {
            let mut documents = plan.collection_documents.clone();
            documents.shift_remove(&plan.from_key);
            self.service.put_collection(&plan.to_collection, &documents)?;
            self.service.delete_collection(&plan.from_collection)?;
            return self
                .service
                .put_key(&plan.to_collection, &plan.to_key, &plan.content);
        }
        self.service
            .put_key(&plan.to_collection, &plan.to_key, &plan.content)?;
        if plan.renames_key() {
            self.service.delete_key(&plan.from_collection, &plan.from_key)?;
        }
        Ok(())
    }

    fn revert(&self, collection: &str, version_id: &str) -> Result<DocumentMap, AppError> {
        self.service.revert_to_version(collection, version_id)?;
        self.service.get_collection(collection)
    }
}

fn command_label(cmd: &CoreCmd) -> &'static str {
    match cmd {
        CoreCmd::ListCollections => "list_collections",
        CoreCmd::LoadCollection { .. } => "load_collection",
        CoreCmd::LoadKeyHistory { .. } => "load_key_history",
        CoreCmd::CreateCollection { .. } => "create_collection",
        CoreCmd::DeleteCollection { .. } => "delete_collection",
        CoreCmd::PutKey { .. } => "put_key",
        CoreCmd::DeleteKey { .. } => "delete_key",
        CoreCmd::SaveDocument { .. } => "save_document",
        CoreCmd::RevertToVersion { .. } => "revert_to_version",
    }
}

/// Spawn the backend worker thread that performs blocking store access.
///
/// All I/O stays off the session thread; the worker replies with
/// [`CoreEvent`] values that the session polls.
///
/// # Returns
/// A [`BackendHandle`] containing the command sender and event receiver.
///
/// # Panics
/// Panics if the worker thread cannot be spawned.
pub fn spawn_backend<S>(service: S) -> BackendHandle
where
    S: DatabaseService + Send + 'static,
{
    let (cmd_tx, cmd_rx) = unbounded();
    let (evt_tx, evt_rx) = unbounded();

    thread::Builder::new()
        .name("dbedit-backend".to_string())
        .spawn(move || {
            let perf_log_enabled = env_flag_enabled("DBEDIT_BACKEND_PERF_LOG");
            let state = WorkerState { service, evt_tx };
            for cmd in cmd_rx.iter() {
                let started = Instant::now();
                let label = command_label(&cmd);
                state.handle(cmd);
                if perf_log_enabled {
                    info!(
                        target: "dbedit_editor::backend_perf",
                        op = label,
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        "backend command perf"
                    );
                }
            }
        })
        .expect("spawn backend worker");

    BackendHandle { cmd_tx, evt_rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbedit_core::models::VersionRecord;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingService {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingService {
        fn record(&self, call: String) -> Result<(), AppError> {
            let failing = self
                .fail_on
                .is_some_and(|prefix| call.starts_with(prefix));
            self.calls.lock().expect("calls lock").push(call);
            if failing {
                Err(AppError::StorageMessage("boom".to_string()))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl DatabaseService for RecordingService {
        fn list_collections(&self) -> Result<Vec<String>, AppError> {
            self.record("list".to_string())?;
            Ok(vec!["system".to_string()])
        }

        fn get_collection(&self, name: &str) -> Result<DocumentMap, AppError> {
            self.record(format!("get {}", name))?;
            Ok(DocumentMap::new())
        }

        fn get_key_history(
            &self,
            collection: &str,
            key: &str,
        ) -> Result<Vec<VersionRecord>, AppError> {
            self.record(format!("history {}/{}", collection, key))?;
            Ok(Vec::new())
        }

        fn put_collection(&self, name: &str, documents: &DocumentMap) -> Result<(), AppError> {
            let keys: Vec<&str> = documents.keys().map(String::as_str).collect();
            self.record(format!("put_collection {} {:?}", name, keys))
        }

        fn delete_collection(&self, name: &str) -> Result<(), AppError> {
            self.record(format!("delete_collection {}", name))
        }

        fn put_key(&self, collection: &str, key: &str, _content: &Value) -> Result<(), AppError> {
            self.record(format!("put_key {}/{}", collection, key))
        }

        fn delete_key(&self, collection: &str, key: &str) -> Result<(), AppError> {
            self.record(format!("delete_key {}/{}", collection, key))
        }

        fn revert_to_version(&self, collection: &str, version_id: &str) -> Result<(), AppError> {
            self.record(format!("revert {} {}", collection, version_id))
        }
    }

    fn plan(to_collection: &str, to_key: &str) -> SavePlan {
        let mut documents = DocumentMap::new();
        documents.insert("key".to_string(), Value::Null);
        documents.insert("other".to_string(), Value::Null);
        SavePlan {
            from_collection: "db".to_string(),
            from_key: "key".to_string(),
            to_collection: to_collection.to_string(),
            to_key: to_key.to_string(),
            content: Value::Null,
            collection_documents: documents,
        }
    }

    fn state(service: RecordingService) -> (WorkerState<RecordingService>, Receiver<CoreEvent>) {
        let (evt_tx, evt_rx) = unbounded();
        (WorkerState { service, evt_tx }, evt_rx)
    }

    #[test]
    fn save_with_collection_rename_orders_calls() {
        let service = RecordingService::default();
        let (worker, _rx) = state(service.clone());
        worker.save_document(&plan("newDB", "key_name")).expect("save");
        assert_eq!(
            service.calls(),
            vec![
                "put_collection newDB [\"other\"]".to_string(),
                "delete_collection db".to_string(),
                "put_key newDB/key_name".to_string(),
            ]
        );
    }

    #[test]
    fn save_with_key_rename_deletes_old_key_after_put() {
        let service = RecordingService::default();
        let (worker, _rx) = state(service.clone());
        worker.save_document(&plan("db", "renamed")).expect("save");
        assert_eq!(
            service.calls(),
            vec!["put_key db/renamed".to_string(), "delete_key db/key".to_string()]
        );
    }

    #[test]
    fn save_without_rename_is_a_single_put() {
        let service = RecordingService::default();
        let (worker, _rx) = state(service.clone());
        worker.save_document(&plan("db", "key")).expect("save");
        assert_eq!(service.calls(), vec!["put_key db/key".to_string()]);
    }

    #[test]
    fn failed_step_stops_the_save_and_reports_action_error() {
        let service = RecordingService {
            fail_on: Some("delete_collection"),
            ..RecordingService::default()
        };
        let (worker, rx) = state(service.clone());
        let op = OpKey::for_key(crate::busy::OpKind::Save, "db", "key");
        worker.handle(CoreCmd::SaveDocument {
            op: op.clone(),
            plan: plan("newDB", "key"),
        });
        assert_eq!(service.calls().len(), 2);
        match rx.try_recv().expect("error event") {
            CoreEvent::Error {
                source: CoreErrorSource::Action(failed),
                message,
            } => {
                assert_eq!(failed, op);
                assert!(message.contains("boom"), "message: {}", message);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn create_collection_refuses_existing_name() {
        let service = RecordingService::default();
        let (worker, _rx) = state(service.clone());
        let err = worker
            .create_collection("system", &DocumentMap::new())
            .expect_err("duplicate");
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(service.calls(), vec!["list".to_string()]);
    }
}
