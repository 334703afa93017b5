//! Status banner and toast queue.

use super::{
    ActionError, EditorSession, StatusMessage, ToastMessage, STATUS_TTL, TOAST_LIMIT, TOAST_TTL,
};
use std::time::Instant;
use tracing::debug;

impl EditorSession {
    /// Sets the status banner message and mirrors it into the toast queue.
    pub(super) fn set_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.status = Some(StatusMessage {
            text: text.clone(),
            expires_at: Instant::now() + STATUS_TTL,
        });
        self.push_toast(text);
    }

    fn push_toast(&mut self, text: String) {
        let now = Instant::now();
        if let Some(last) = self.toasts.back_mut() {
            if last.text == text {
                last.expires_at = now + TOAST_TTL;
                return;
            }
        }
        self.toasts.push_back(ToastMessage {
            text,
            expires_at: now + TOAST_TTL,
        });
        while self.toasts.len() > TOAST_LIMIT {
            self.toasts.pop_front();
        }
    }

    pub(super) fn expire_feedback(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|status| status.expires_at <= now)
        {
            self.status = None;
        }
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    /// Records a surfaced backend failure.
    pub(super) fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.last_error = Some(message.clone());
        self.set_status(message);
    }

    /// Records a refused action and hands it back to the caller.
    pub(super) fn reject(&mut self, err: ActionError) -> ActionError {
        debug!("action refused: {}", err);
        self.last_rejection = Some(err.clone());
        self.set_status(err.to_string());
        err
    }
}
