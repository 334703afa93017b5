//! Backend event application.

use super::EditorSession;
use crate::backend::{CoreErrorSource, CoreEvent, SavePlan};
use crate::busy::{OpKey, OpKind};
use crate::selection::CollectionOutcome;
use tracing::{debug, info, warn};

impl EditorSession {
    pub(super) fn apply_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::CollectionsListed { names } => {
                let previous_key = self.selection.selected_key().map(str::to_string);
                let previous_collection =
                    self.selection.selected_collection().map(str::to_string);
                match self.selection.apply_catalog(names) {
                    Some(next) => {
                        let requested = previous_key
                            .filter(|_| previous_collection.as_deref() == Some(next.as_str()));
                        self.load_collection(&next, requested);
                    }
                    None => {
                        info!("store has no databases");
                        self.clear_buffer();
                    }
                }
            }
            CoreEvent::CollectionLoaded {
                ticket,
                name,
                documents,
            } => match self.selection.apply_collection(ticket, &name, documents) {
                CollectionOutcome::Selected(_) => self.reseed_buffer(),
                CollectionOutcome::Empty => self.clear_buffer(),
                CollectionOutcome::Stale => {}
            },
            CoreEvent::KeyHistoryLoaded {
                ticket,
                collection,
                key,
                versions,
            } => {
                if ticket == self.history_ticket {
                    self.history = versions;
                } else {
                    debug!(
                        collection = collection.as_str(),
                        key = key.as_str(),
                        "dropping stale history response"
                    );
                }
            }
            CoreEvent::CollectionCreated {
                op,
                name,
                documents,
            } => {
                self.busy.finish(&op);
                self.selection.insert_collection(&name, documents);
                self.edit_collection_name = name.clone();
                self.reseed_buffer();
                self.set_status(format!("Added database [{}]", name));
            }
            CoreEvent::CollectionDeleted { op, name } => {
                self.busy.finish(&op);
                if let Some(next) = self.selection.remove_collection(&name) {
                    self.load_collection(&next, None);
                } else if self.selection.selected_collection().is_none() {
                    self.clear_buffer();
                }
                self.set_status(format!("Removed database [{}]", name));
            }
            CoreEvent::KeyPut {
                op,
                collection,
                key,
                content,
            } => {
                self.busy.finish(&op);
                self.selection.upsert_document(&collection, &key, content);
                let created = matches!(op.kind, OpKind::CreateKey | OpKind::ForkKey);
                if created && self.selection.select_key(&key) {
                    self.reseed_buffer();
                }
                self.set_status(format!("Setting key [{}] in database [{}]", key, collection));
            }
            CoreEvent::KeyDeleted {
                op,
                collection,
                key,
            } => {
                self.busy.finish(&op);
                let was_selected = self.selection.selected_collection()
                    == Some(collection.as_str())
                    && self.selection.selected_key() == Some(key.as_str());
                self.selection.remove_document(&collection, &key);
                if was_selected {
                    self.reseed_buffer();
                }
                self.set_status(format!("Removed key [{}] from database [{}]", key, collection));
            }
            CoreEvent::DocumentSaved { op, plan } => {
                self.busy.finish(&op);
                self.apply_saved(&op, plan);
            }
            CoreEvent::VersionRestored {
                op,
                collection,
                version_id,
                documents,
                previous_key,
            } => {
                self.busy.finish(&op);
                if self.selection.selected_collection() == Some(collection.as_str()) {
                    self.selection.reconcile_after_restore(
                        &collection,
                        previous_key.as_deref(),
                        documents,
                    );
                    self.reseed_buffer();
                } else {
                    debug!(
                        collection = collection.as_str(),
                        "restore finished for a database no longer selected"
                    );
                }
                self.set_status(format!(
                    "Restored database [{}] to version [{}]",
                    collection, version_id
                ));
            }
            CoreEvent::Error { source, message } => self.apply_error(source, message),
        }
    }

    fn apply_saved(&mut self, op: &OpKey, plan: SavePlan) {
        if plan.renames_collection() {
            self.selection
                .rename_collection(&plan.from_collection, &plan.to_collection);
        }
        let viewing = self.selection.selected_collection() == Some(plan.to_collection.as_str())
            && self.selection.selected_key() == Some(plan.from_key.as_str());
        if plan.renames_collection() || plan.renames_key() {
            // Renamed keys are appended by the store, so mirror that order.
            self.selection
                .remove_document(&plan.to_collection, &plan.from_key);
        }
        self.selection
            .upsert_document(&plan.to_collection, &plan.to_key, plan.content.clone());
        if plan.renames_collection()
            && self.selection.selected_collection() == Some(plan.to_collection.as_str())
            && self.edit_collection_name == plan.from_collection
        {
            // Another key was selected while the save was in flight.
            self.edit_collection_name = plan.to_collection.clone();
        }
        if viewing {
            self.selection.force_key(Some(plan.to_key.clone()));
            self.edit_collection_name = plan.to_collection.clone();
            self.edit_key_name = plan.to_key.clone();
            self.buffer.mark_clean();
            self.request_history(plan.to_key.clone());
        }
        info!("{} finished as [{}/{}]", op, plan.to_collection, plan.to_key);
        self.set_status(format!(
            "Saved key [{}] in database [{}]",
            plan.to_key, plan.to_collection
        ));
    }

    fn apply_error(&mut self, source: CoreErrorSource, message: String) {
        match source {
            CoreErrorSource::Catalog => {
                warn!("catalog load failed: {}", message);
                self.report_error(message);
            }
            CoreErrorSource::Collection { ticket, name } => {
                if ticket != self.selection.load_ticket() {
                    debug!(
                        collection = name.as_str(),
                        "dropping stale collection failure"
                    );
                    return;
                }
                warn!("database [{}] failed to load: {}", name, message);
                self.report_error(message);
            }
            CoreErrorSource::History { ticket } => {
                if ticket == self.history_ticket {
                    self.report_error(message);
                }
            }
            CoreErrorSource::Action(op) => {
                self.busy.finish(&op);
                warn!("{} failed: {}", op, message);
                self.report_error(message);
            }
        }
    }
}
