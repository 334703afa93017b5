//! Backend worker wiring for the editor session.
//!
//! This module exposes the command/event protocol plus the worker spawn helper
//! used by the session thread.

mod protocol;
mod worker;

pub use protocol::{CoreCmd, CoreErrorSource, CoreEvent, SavePlan};
pub use worker::{spawn_backend, BackendHandle};
