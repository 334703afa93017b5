//! Editor buffer adapter: one get/set contract over a structured editor or a
//! plain-text fallback.
//!
//! A buffer is seeded with one document and immediately asks the factory for a
//! structured editor while arming a [`FallbackTimer`]. Whichever of
//! "structured ready" or "timer due" happens first wins for the lifetime of
//! that buffer; the loser is ignored.

use dbedit_core::guard::Rejection;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Rich JSON editing surface supplied by the rendering layer.
pub trait StructuredEditor {
    /// Current document held by the editor.
    fn get(&self) -> Value;
    /// Replace the document held by the editor.
    fn set(&mut self, value: &Value);
}

/// Builds structured editors; construction may fail.
pub trait StructuredEditorFactory {
    /// Start constructing an editor seeded with `seed`.
    ///
    /// Readiness is reported later through
    /// [`EditorBuffer::structured_ready`].
    ///
    /// # Errors
    /// [`EditorInitError`] when the editor cannot be constructed at all.
    fn create(&mut self, seed: &Value) -> Result<Box<dyn StructuredEditor>, EditorInitError>;
}

/// Structured editor construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("structured editor failed to initialize: {0}")]
pub struct EditorInitError(pub String);

/// Which editing surface is live, as exposed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Seeded, structured editor not ready yet (or no document at all).
    Uninitialized,
    Structured,
    PlainText,
}

/// Explicitly cancellable deadline for the structured-editor race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackTimer {
    deadline: Instant,
    cancelled: bool,
}

impl FallbackTimer {
    pub fn arm(now: Instant, timeout: Duration) -> Self {
        Self {
            deadline: now + timeout,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the timer fires at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        !self.cancelled && now >= self.deadline
    }
}

enum Surface {
    Uninitialized,
    Pending {
        editor: Box<dyn StructuredEditor>,
        timer: FallbackTimer,
    },
    Structured(Box<dyn StructuredEditor>),
    PlainText {
        raw_text: String,
    },
}

/// The single live editing buffer for the selected key.
pub struct EditorBuffer {
    generation: u64,
    surface: Surface,
    last_known_good: Value,
    dirty: bool,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::new(0, Value::Null)
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("generation", &self.generation)
            .field("mode", &self.mode())
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn serialize_for_text(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl EditorBuffer {
    /// A buffer seeded with `content`, before any editor construction.
    pub fn new(generation: u64, content: Value) -> Self {
        Self {
            generation,
            surface: Surface::Uninitialized,
            last_known_good: content,
            dirty: false,
        }
    }

    /// Seed a buffer and immediately start the structured-editor race.
    pub fn seeded(
        generation: u64,
        content: Value,
        factory: &mut dyn StructuredEditorFactory,
        now: Instant,
        timeout: Duration,
    ) -> Self {
        let mut buffer = Self::new(generation, content);
        buffer.start(factory, now, timeout);
        buffer
    }

    /// Request the structured editor and arm the fallback timer.
    ///
    /// Synchronous construction failure falls back to plain text at once.
    /// Calling this on a buffer that already left `Uninitialized` is a no-op.
    pub fn start(
        &mut self,
        factory: &mut dyn StructuredEditorFactory,
        now: Instant,
        timeout: Duration,
    ) {
        if !matches!(self.surface, Surface::Uninitialized) {
            return;
        }
        match factory.create(&self.last_known_good) {
            Ok(editor) => {
                self.surface = Surface::Pending {
                    editor,
                    timer: FallbackTimer::arm(now, timeout),
                };
            }
            Err(err) => {
                warn!(generation = self.generation, "{}; using plain text", err);
                self.fall_back();
            }
        }
    }

    fn fall_back(&mut self) {
        self.surface = Surface::PlainText {
            raw_text: serialize_for_text(&self.last_known_good),
        };
    }

    /// Identity of this buffer instance; ready signals must carry it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mode(&self) -> BufferMode {
        match self.surface {
            Surface::Uninitialized | Surface::Pending { .. } => BufferMode::Uninitialized,
            Surface::Structured(_) => BufferMode::Structured,
            Surface::PlainText { .. } => BufferMode::PlainText,
        }
    }

    /// Whether the structured editor is constructed but not ready yet.
    pub fn is_pending(&self) -> bool {
        matches!(self.surface, Surface::Pending { .. })
    }

    /// Deadline of the armed fallback timer, if the race is still open.
    pub fn fallback_deadline(&self) -> Option<Instant> {
        match &self.surface {
            Surface::Pending { timer, .. } => Some(timer.deadline()),
            _ => None,
        }
    }

    /// Structured editor signalled readiness.
    ///
    /// # Returns
    /// `true` when this signal won the race for this buffer instance.
    pub fn structured_ready(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                signal = generation,
                live = self.generation,
                "ignoring ready signal for superseded buffer"
            );
            return false;
        }
        let surface = std::mem::replace(&mut self.surface, Surface::Uninitialized);
        match surface {
            Surface::Pending { editor, mut timer } => {
                timer.cancel();
                self.surface = Surface::Structured(editor);
                true
            }
            other => {
                if matches!(other, Surface::PlainText { .. }) {
                    debug!(generation, "late structured ready ignored after fallback");
                }
                self.surface = other;
                false
            }
        }
    }

    /// Advance the fallback timer.
    ///
    /// # Returns
    /// `true` when the timer fired and the buffer switched to plain text.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match &self.surface {
            Surface::Pending { timer, .. } => timer.is_due(now),
            _ => false,
        };
        if due {
            warn!(
                generation = self.generation,
                "structured editor not ready in time; using plain text"
            );
            self.fall_back();
        }
        due
    }

    /// Read the current document.
    ///
    /// Structured mode always re-reads the editor. Plain-text mode parses the
    /// raw text.
    ///
    /// # Errors
    /// [`Rejection::InvalidJson`] when the plain text does not parse.
    pub fn get(&self) -> Result<Value, Rejection> {
        match &self.surface {
            Surface::Structured(editor) => Ok(editor.get()),
            Surface::PlainText { raw_text } => serde_json::from_str(raw_text)
                .map_err(|err| Rejection::InvalidJson(err.to_string())),
            Surface::Uninitialized | Surface::Pending { .. } => Ok(self.last_known_good.clone()),
        }
    }

    /// Replace the document through whichever surface is live.
    pub fn set(&mut self, value: Value) {
        match &mut self.surface {
            Surface::Structured(editor) | Surface::Pending { editor, .. } => editor.set(&value),
            Surface::PlainText { raw_text } => *raw_text = serialize_for_text(&value),
            Surface::Uninitialized => {}
        }
        self.last_known_good = value;
        self.dirty = true;
    }

    /// Apply a plain-text edit.
    ///
    /// In plain-text mode the text is stored verbatim, valid or not. In the
    /// other modes the text must parse and is forwarded to [`Self::set`].
    ///
    /// # Errors
    /// [`Rejection::InvalidJson`] when a non-plain-text buffer receives text
    /// that does not parse.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), Rejection> {
        let text = text.into();
        if let Surface::PlainText { raw_text } = &mut self.surface {
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                self.last_known_good = value;
            }
            *raw_text = text;
            self.dirty = true;
            return Ok(());
        }
        let value = serde_json::from_str(&text)
            .map_err(|err| Rejection::InvalidJson(err.to_string()))?;
        self.set(value);
        Ok(())
    }

    /// Raw text of the plain-text surface.
    pub fn raw_text(&self) -> Option<&str> {
        match &self.surface {
            Surface::PlainText { raw_text } => Some(raw_text.as_str()),
            _ => None,
        }
    }

    /// Text rendering of the current content for any surface.
    pub fn display_text(&self) -> String {
        match &self.surface {
            Surface::PlainText { raw_text } => raw_text.clone(),
            Surface::Structured(editor) => serialize_for_text(&editor.get()),
            Surface::Uninitialized | Surface::Pending { .. } => {
                serialize_for_text(&self.last_known_good)
            }
        }
    }

    /// Last content known to be valid JSON.
    pub fn last_known_good(&self) -> &Value {
        &self.last_known_good
    }

    /// Change notification from the structured editor.
    pub fn notify_changed(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
