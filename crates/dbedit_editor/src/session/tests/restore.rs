use super::*;

fn request_restore(harness: &mut TestHarness, version_id: &str) -> (OpKey, Option<String>) {
    harness
        .session
        .restore(RestoreRequest::new(version_id))
        .expect("restore allowed");
    match recv_cmd(&harness.cmd_rx) {
        CoreCmd::RevertToVersion {
            op,
            collection,
            version_id: sent,
            previous_key,
        } => {
            assert_eq!(collection, "system");
            assert_eq!(sent, version_id);
            (op, previous_key)
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

fn restored(
    harness: &mut TestHarness,
    op: OpKey,
    previous_key: Option<String>,
    documents: DocumentMap,
) {
    harness.feed(CoreEvent::VersionRestored {
        op,
        collection: "system".to_string(),
        version_id: "7a1b".to_string(),
        documents,
        previous_key,
    });
}

#[test]
fn restore_keeps_selected_key_when_it_survives() {
    let mut harness = make_loaded_session();
    harness.ready();
    let generation = harness.session.buffer_generation();

    let (op, previous_key) = request_restore(&mut harness, "7a1b");
    assert_eq!(previous_key.as_deref(), Some("publishinfo"));
    assert!(harness.session.is_busy(&op));

    restored(
        &mut harness,
        op.clone(),
        previous_key,
        docs(&[("publishinfo", json!({"buckets": ["b"]})), ("other", json!(2))]),
    );
    assert_eq!(harness.session.selected_key(), Some("publishinfo"));
    assert_ne!(harness.session.buffer_generation(), generation);
    assert_eq!(*harness.live_editor().borrow(), json!({"buckets": ["b"]}));
    assert!(!harness.session.is_busy(&op));
    assert_eq!(
        harness.session.status_text(),
        Some("Restored database [system] to version [7a1b]")
    );
}

#[test]
fn restore_selects_first_key_when_previous_is_gone() {
    let mut harness = make_loaded_session();
    harness.session.select_key("somekey");
    harness.answer_history();

    let (op, previous_key) = request_restore(&mut harness, "7a1b");
    assert_eq!(previous_key.as_deref(), Some("somekey"));
    restored(
        &mut harness,
        op,
        previous_key,
        docs(&[("publishinfo", json!({})), ("other", json!(2))]),
    );
    assert_eq!(harness.session.selected_key(), Some("publishinfo"));
    assert_eq!(
        harness.session.key_names(),
        vec!["publishinfo".to_string(), "other".to_string()]
    );
    assert_eq!(harness.session.edit_key_name(), "publishinfo");
}

#[test]
fn restore_rebuilds_buffer_even_for_same_key() {
    let mut harness = make_session_with(2000, true);
    harness.open(&["system"], system_docs());
    harness.session.edit_text("{ half typed").expect("plain text");

    let (op, previous_key) = request_restore(&mut harness, "7a1b");
    restored(&mut harness, op, previous_key, system_docs());
    assert_eq!(harness.session.selected_key(), Some("publishinfo"));
    assert!(!harness.session.is_dirty());
    assert!(harness.session.buffer_text().contains("branch_buckets"));
}

#[test]
fn restore_is_not_reentrant() {
    let mut harness = make_loaded_session();
    let (op, _) = request_restore(&mut harness, "7a1b");
    assert_eq!(
        harness.session.restore(RestoreRequest::new("other")),
        Err(ActionError::Busy(op))
    );
    harness.assert_no_cmd();
}

#[test]
fn failed_restore_leaves_selection_untouched() {
    let mut harness = make_loaded_session();
    harness.session.select_key("somekey");
    harness.answer_history();
    let (op, _) = request_restore(&mut harness, "deadbeef");

    harness.feed(CoreEvent::Error {
        source: CoreErrorSource::Action(op.clone()),
        message: "Restore version [system] failed: Not found".to_string(),
    });
    assert!(!harness.session.is_busy(&op));
    assert_eq!(harness.session.selected_key(), Some("somekey"));
    assert_eq!(harness.session.key_names().len(), 2);
    assert_eq!(
        harness.session.last_error(),
        Some("Restore version [system] failed: Not found")
    );
}
