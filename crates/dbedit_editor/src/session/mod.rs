//! Editor session: the operation orchestrator for collections and keys.
//!
//! [`EditorSession`] exclusively owns the selection, the single live
//! [`EditorBuffer`], and the busy flags. Mutation happens only through the
//! action methods (see `actions.rs`) and through [`EditorSession::poll`],
//! which applies backend events.

mod actions;
mod events;
mod feedback;
mod view;

#[cfg(test)]
mod tests;

use crate::backend::{BackendHandle, CoreCmd};
use crate::buffer::{EditorBuffer, StructuredEditorFactory};
use crate::busy::{BusyFlags, OpKey};
use crate::selection::SelectionState;
use dbedit_core::guard::Rejection;
use dbedit_core::models::VersionRecord;
use dbedit_core::Config;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub use view::ToastView;

const STATUS_TTL: Duration = Duration::from_secs(5);
const TOAST_TTL: Duration = Duration::from_secs(4);
const TOAST_LIMIT: usize = 4;

/// Why an action was not started.
///
/// Nothing was sent to the backend and no state changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("{0} is already in progress")]
    Busy(OpKey),
    #[error("No database selected")]
    NoCollectionSelected,
    #[error("No key selected")]
    NoKeySelected,
    #[error("Backend worker is not running")]
    BackendUnavailable,
}

/// Inbound request from the history collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRequest {
    pub version_id: String,
}

impl RestoreRequest {
    pub fn new(version_id: impl Into<String>) -> Self {
        Self {
            version_id: version_id.into(),
        }
    }
}

/// File handed to the download collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadPayload {
    pub file_name: String,
    pub file_type: &'static str,
    pub data: Value,
}

struct StatusMessage {
    text: String,
    expires_at: Instant,
}

struct ToastMessage {
    text: String,
    expires_at: Instant,
}

/// Selection, buffer, and action state for one editing session.
pub struct EditorSession {
    backend: BackendHandle,
    selection: SelectionState,
    buffer: EditorBuffer,
    factory: Box<dyn StructuredEditorFactory>,
    fallback_timeout: Duration,
    next_generation: u64,
    busy: BusyFlags,
    edit_collection_name: String,
    edit_key_name: String,
    history: Vec<VersionRecord>,
    history_ticket: u64,
    last_rejection: Option<ActionError>,
    last_error: Option<String>,
    status: Option<StatusMessage>,
    toasts: VecDeque<ToastMessage>,
}

impl EditorSession {
    /// Build a session and request the collection catalog.
    pub fn new(
        backend: BackendHandle,
        factory: Box<dyn StructuredEditorFactory>,
        config: &Config,
    ) -> Self {
        let mut session = Self {
            backend,
            selection: SelectionState::default(),
            buffer: EditorBuffer::default(),
            factory,
            fallback_timeout: config.editor_fallback_timeout(),
            next_generation: 1,
            busy: BusyFlags::default(),
            edit_collection_name: String::new(),
            edit_key_name: String::new(),
            history: Vec::new(),
            history_ticket: 0,
            last_rejection: None,
            last_error: None,
            status: None,
            toasts: VecDeque::with_capacity(TOAST_LIMIT),
        };
        session.reload_catalog();
        session
    }

    /// Drain backend events and advance the fallback timer.
    pub fn poll(&mut self, now: Instant) {
        while let Ok(event) = self.backend.evt_rx.try_recv() {
            self.apply_event(event);
        }
        self.buffer.tick(now);
        self.expire_feedback(now);
    }

    /// Request the collection catalog again.
    pub fn reload_catalog(&mut self) {
        if self.backend.cmd_tx.send(CoreCmd::ListCollections).is_err() {
            warn!("backend unavailable; catalog not requested");
            self.report_error("Backend worker is not running");
        }
    }

    /// Select a collection and fetch its documents.
    ///
    /// Unknown names are ignored.
    pub fn select_collection(&mut self, name: &str) {
        self.load_collection(name, None);
    }

    /// Select a key of the loaded collection and re-seed the buffer.
    ///
    /// Selecting the current key again is a no-op.
    pub fn select_key(&mut self, key: &str) {
        if self.selection.select_key(key) {
            self.reseed_buffer();
        }
    }

    /// Readiness signal from the structured editor of buffer `generation`.
    pub fn structured_editor_ready(&mut self, generation: u64) {
        self.buffer.structured_ready(generation);
    }

    /// Change notification from the structured editor.
    pub fn editor_changed(&mut self) {
        self.buffer.notify_changed();
    }

    /// Apply a plain-text edit to the live buffer.
    ///
    /// # Errors
    /// [`Rejection::InvalidJson`] when a structured buffer receives text that
    /// does not parse.
    pub fn edit_text(&mut self, text: impl Into<String>) -> Result<(), Rejection> {
        self.buffer.set_text(text)
    }

    /// Replace the live buffer content.
    pub fn set_content(&mut self, value: Value) {
        self.buffer.set(value);
    }

    /// Edit the pending collection name used by the next save.
    pub fn set_collection_name(&mut self, name: impl Into<String>) {
        self.edit_collection_name = name.into();
    }

    /// Edit the pending key name used by the next save.
    pub fn set_key_name(&mut self, name: impl Into<String>) {
        self.edit_key_name = name.into();
    }

    fn load_collection(&mut self, name: &str, requested_key: Option<String>) {
        let Some(ticket) = self.selection.begin_collection_load(name, requested_key) else {
            debug!(collection = name, "ignoring selection of unknown database");
            return;
        };
        self.clear_buffer();
        self.edit_collection_name = name.to_string();
        let cmd = CoreCmd::LoadCollection {
            ticket,
            name: name.to_string(),
        };
        if self.backend.cmd_tx.send(cmd).is_err() {
            self.report_error("Backend worker is not running");
        }
    }

    /// Discard the live buffer and seed a new one from the selected key.
    fn reseed_buffer(&mut self) {
        let (Some(key), Some(content)) = (
            self.selection.selected_key().map(str::to_string),
            self.selection.selected_content().cloned(),
        ) else {
            self.clear_buffer();
            return;
        };
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        self.buffer = EditorBuffer::seeded(
            generation,
            content,
            self.factory.as_mut(),
            Instant::now(),
            self.fallback_timeout,
        );
        if let Some(collection) = self.selection.selected_collection() {
            self.edit_collection_name = collection.to_string();
        }
        self.edit_key_name = key.clone();
        self.request_history(key);
    }

    fn clear_buffer(&mut self) {
        self.buffer = EditorBuffer::default();
        self.edit_key_name.clear();
        self.history.clear();
        self.history_ticket = self.history_ticket.wrapping_add(1);
    }

    fn request_history(&mut self, key: String) {
        let Some(collection) = self.selection.selected_collection().map(str::to_string) else {
            return;
        };
        self.history.clear();
        self.history_ticket = self.history_ticket.wrapping_add(1);
        let cmd = CoreCmd::LoadKeyHistory {
            ticket: self.history_ticket,
            collection,
            key,
        };
        if self.backend.cmd_tx.send(cmd).is_err() {
            warn!("backend unavailable; history not requested");
        }
    }
}
