//! Session tests driven through test channels instead of a worker thread.

use super::*;
use crate::backend::{CoreCmd, CoreErrorSource, CoreEvent};
use crate::buffer::{BufferMode, EditorInitError, StructuredEditor};
use crate::busy::{OpKey, OpKind};
use crate::selection::{CatalogStatus, NoDataReason};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use dbedit_core::models::DocumentMap;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct EditorLog {
    editors: Vec<Rc<RefCell<Value>>>,
    fail: bool,
}

struct TestEditor {
    value: Rc<RefCell<Value>>,
}

impl StructuredEditor for TestEditor {
    fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set(&mut self, value: &Value) {
        *self.value.borrow_mut() = value.clone();
    }
}

struct TestFactory {
    log: Rc<RefCell<EditorLog>>,
}

impl StructuredEditorFactory for TestFactory {
    fn create(&mut self, seed: &Value) -> Result<Box<dyn StructuredEditor>, EditorInitError> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            return Err(EditorInitError("widget crashed".to_string()));
        }
        let value = Rc::new(RefCell::new(seed.clone()));
        log.editors.push(value.clone());
        Ok(Box::new(TestEditor { value }))
    }
}

struct TestHarness {
    session: EditorSession,
    cmd_rx: Receiver<CoreCmd>,
    evt_tx: Sender<CoreEvent>,
    editors: Rc<RefCell<EditorLog>>,
}

impl TestHarness {
    fn feed(&mut self, event: CoreEvent) {
        self.evt_tx.send(event).expect("send event");
        self.session.poll(Instant::now());
    }

    /// Content held by the newest structured editor.
    fn live_editor(&self) -> Rc<RefCell<Value>> {
        self.editors
            .borrow()
            .editors
            .last()
            .cloned()
            .expect("structured editor created")
    }

    /// Signals readiness for the live buffer.
    fn ready(&mut self) {
        let generation = self.session.buffer_generation();
        self.session.structured_editor_ready(generation);
    }

    fn assert_no_cmd(&self) {
        match self.cmd_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// Lists `names`, then answers the first collection fetch with `documents`
    /// and the key history fetch (when a key got selected) with no versions.
    fn open(&mut self, names: &[&str], documents: DocumentMap) {
        let names = names.iter().map(|name| name.to_string()).collect();
        self.feed(CoreEvent::CollectionsListed { names });
        let (ticket, name) = match recv_cmd(&self.cmd_rx) {
            CoreCmd::LoadCollection { ticket, name } => (ticket, name),
            other => panic!("unexpected command: {:?}", other),
        };
        let has_keys = !documents.is_empty();
        self.feed(CoreEvent::CollectionLoaded {
            ticket,
            name,
            documents,
        });
        if has_keys {
            self.answer_history();
        }
    }

    fn answer_history(&mut self) {
        match recv_cmd(&self.cmd_rx) {
            CoreCmd::LoadKeyHistory {
                ticket,
                collection,
                key,
            } => self.feed(CoreEvent::KeyHistoryLoaded {
                ticket,
                collection,
                key,
                versions: Vec::new(),
            }),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

fn make_session_with(fallback_ms: u64, fail_editor: bool) -> TestHarness {
    let (cmd_tx, cmd_rx) = unbounded();
    let (evt_tx, evt_rx) = unbounded();
    let editors = Rc::new(RefCell::new(EditorLog {
        fail: fail_editor,
        ..EditorLog::default()
    }));
    let config = Config {
        editor_fallback_ms: fallback_ms,
        ..Config::default()
    };
    let session = EditorSession::new(
        BackendHandle::from_test_channels(cmd_tx, evt_rx),
        Box::new(TestFactory {
            log: editors.clone(),
        }),
        &config,
    );
    match recv_cmd(&cmd_rx) {
        CoreCmd::ListCollections => {}
        other => panic!("unexpected command: {:?}", other),
    }
    TestHarness {
        session,
        cmd_rx,
        evt_tx,
        editors,
    }
}

fn make_session() -> TestHarness {
    make_session_with(2000, false)
}

fn recv_cmd(rx: &Receiver<CoreCmd>) -> CoreCmd {
    rx.recv_timeout(Duration::from_millis(200))
        .expect("expected outbound command")
}

fn docs(entries: &[(&str, Value)]) -> DocumentMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn system_docs() -> DocumentMap {
    docs(&[
        ("publishinfo", json!({"buckets": [], "branch_buckets": []})),
        ("somekey", json!({"a": 1})),
    ])
}

/// Session with `system` and `new database` listed and `system` loaded.
fn make_loaded_session() -> TestHarness {
    let mut harness = make_session();
    harness.open(&["system", "new database"], system_docs());
    harness
}

mod restore;
