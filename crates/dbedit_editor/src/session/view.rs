//! Read-only projections for the rendering layer.

use super::{ActionError, EditorSession};
use crate::buffer::{BufferMode, EditorBuffer};
use crate::busy::{BusyFlags, OpKey, OpKind};
use crate::selection::{CatalogStatus, NoDataReason, SelectionState};
use dbedit_core::models::VersionRecord;

/// One visible toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastView<'a> {
    pub text: &'a str,
}

impl EditorSession {
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn collection_names(&self) -> &[String] {
        self.selection.collection_names()
    }

    pub fn key_names(&self) -> Vec<String> {
        self.selection.key_names()
    }

    pub fn selected_collection(&self) -> Option<&str> {
        self.selection.selected_collection()
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selection.selected_key()
    }

    pub fn selected_collection_index(&self) -> Option<usize> {
        self.selection.selected_collection_index()
    }

    pub fn selected_key_index(&self) -> Option<usize> {
        self.selection.selected_key_index()
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.selection.catalog_status()
    }

    pub fn no_data(&self) -> Option<NoDataReason> {
        self.selection.no_data()
    }

    pub fn buffer_mode(&self) -> BufferMode {
        self.buffer.mode()
    }

    /// Generation the structured editor must echo in its ready signal.
    pub fn buffer_generation(&self) -> u64 {
        self.buffer.generation()
    }

    /// Text for the plain-text surface (or a preview in other modes).
    pub fn buffer_text(&self) -> String {
        self.buffer.display_text()
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }

    /// Collection name currently entered for the next save.
    pub fn edit_collection_name(&self) -> &str {
        &self.edit_collection_name
    }

    /// Key name currently entered for the next save.
    pub fn edit_key_name(&self) -> &str {
        &self.edit_key_name
    }

    pub fn busy(&self) -> &BusyFlags {
        &self.busy
    }

    pub fn is_busy(&self, op: &OpKey) -> bool {
        self.busy.is_busy(op)
    }

    /// Whether any action of `kind` is in flight, whatever its target.
    pub fn is_kind_busy(&self, kind: OpKind) -> bool {
        self.busy.is_kind_busy(kind)
    }

    /// Versions of the selected key, newest first.
    pub fn history(&self) -> &[VersionRecord] {
        &self.history
    }

    pub fn last_rejection(&self) -> Option<&ActionError> {
        self.last_rejection.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    pub fn toasts(&self) -> impl Iterator<Item = ToastView<'_>> {
        self.toasts.iter().map(|toast| ToastView {
            text: toast.text.as_str(),
        })
    }
}
