//! Shared test-only helpers for dbedit_core.

use crate::Database;
use std::env;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tempfile::TempDir;

/// Creates an isolated temporary store and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation, path conversion, or store initialization
/// fails in the test environment.
pub(crate) fn setup_temp_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("db");
    let db = Database::new(db_path.to_str().expect("db path")).expect("db");
    (db, temp_dir)
}

/// Environment overrides for one test, undone on drop.
///
/// Holds a process-wide lock so tests touching the environment run one at a
/// time.
pub(crate) struct ScopedEnv {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    pub(crate) fn new() -> Self {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let lock = LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Self {
            _lock: lock,
            saved: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.saved.push((key.to_string(), env::var(key).ok()));
        env::set_var(key, value);
        self
    }

    pub(crate) fn unset(&mut self, key: &str) -> &mut Self {
        self.saved.push((key.to_string(), env::var(key).ok()));
        env::remove_var(key);
        self
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
    }
}

#[test]
fn scoped_env_restores_previous_values() {
    let key = "DBEDIT_TEST_SCOPED_ENV";
    let mut scoped = ScopedEnv::new();
    scoped.set(key, "first").set(key, "second");
    assert_eq!(env::var(key).ok().as_deref(), Some("second"));
    drop(scoped);
    assert!(env::var(key).is_err());
}
