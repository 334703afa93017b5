//! Document editor state machine for dbedit.
//!
//! The [`session::EditorSession`] owns selection state, the live editor
//! buffer, and per-action busy flags. All store access runs on the backend
//! worker thread; the session only sends commands and applies events.

/// Backend worker + protocol types used by the session and headless tests.
pub mod backend;
/// Structured/plain-text editor buffer with timed fallback.
pub mod buffer;
/// Per-action busy flags.
pub mod busy;
/// Collection/key selection and catalog state.
pub mod selection;
/// The operation orchestrator and its read-only view.
pub mod session;

pub use backend::{spawn_backend, BackendHandle, CoreCmd, CoreEvent};
pub use buffer::{BufferMode, EditorBuffer, StructuredEditor, StructuredEditorFactory};
pub use busy::{BusyFlags, OpKey, OpKind};
pub use selection::{NoDataReason, SelectionState};
pub use session::{ActionError, DownloadPayload, EditorSession, RestoreRequest};
