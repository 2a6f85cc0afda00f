use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use todo_core::db::migrations::latest_version;
use todo_core::db::{open_db, open_db_in_memory};
use todo_core::{
    MemoryStateStorage, RepoError, SqliteStateStorage, StateStorage, TaskFilter, TaskId,
    TodoStore, STATE_STORAGE_KEY,
};

fn stored_payload(storage: &impl StateStorage) -> Value {
    let raw = storage.read_slot(STATE_STORAGE_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn seeded_payload() -> Value {
    json!({
        "state": {
            "tasks": [
                { "id": "00000000-0000-4000-8000-000000000001", "text": "買牛奶", "completed": false, "createdAt": "2025-11-30T10:00:00.000Z" },
                { "id": "00000000-0000-4000-8000-000000000002", "text": "買豆漿", "completed": true, "createdAt": "2025-11-30T11:00:00.000Z" }
            ],
            "filter": "all"
        },
        "version": 1
    })
}

#[test]
fn add_writes_task_to_slot() {
    let mut store = TodoStore::open(MemoryStateStorage::new());
    store.add("買牛奶");

    let payload = stored_payload(store.storage());
    assert_eq!(payload["state"]["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(payload["state"]["tasks"][0]["text"], "買牛奶");
    assert_eq!(payload["version"], 1);
}

#[test]
fn filter_and_completion_are_persisted() {
    let mut store = TodoStore::open(MemoryStateStorage::new());
    store.add("買牛奶");
    let id = store.tasks()[0].id.clone();
    store.toggle(&id);
    store.set_filter(TaskFilter::Completed);

    let payload = stored_payload(store.storage());
    assert_eq!(payload["state"]["tasks"][0]["completed"], true);
    assert_eq!(payload["state"]["filter"], "completed");
}

#[test]
fn delete_is_persisted() {
    let mut store = TodoStore::open(MemoryStateStorage::new());
    store.add("買牛奶");
    let id = store.tasks()[0].id.clone();
    store.delete(&id);

    let payload = stored_payload(store.storage());
    assert!(payload["state"]["tasks"].as_array().unwrap().is_empty());
}

#[test]
fn every_committed_mutation_writes_once() {
    let mut store = TodoStore::open(MemoryStateStorage::new());
    store.add("a");
    store.add("b");
    let id = store.tasks()[0].id.clone();
    store.toggle(&id);
    store.update(&id, "A");
    store.set_filter(TaskFilter::Active);
    store.clear_completed();
    store.delete(&id);

    assert_eq!(store.storage().write_count(), 7);
}

#[test]
fn rehydrate_restores_tasks_and_timestamps() {
    let storage = MemoryStateStorage::with_slot(STATE_STORAGE_KEY, seeded_payload().to_string());
    let store = TodoStore::open(storage);

    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.tasks()[0].text, "買牛奶");
    assert_eq!(store.tasks()[1].text, "買豆漿");
    assert!(store.tasks()[1].completed);
    assert_eq!(
        store.tasks()[0].created_at,
        Utc.with_ymd_and_hms(2025, 11, 30, 10, 0, 0).unwrap()
    );
}

#[test]
fn rehydrate_accepts_plain_string_ids() {
    let payload = json!({
        "state": {
            "tasks": [
                { "id": "test-1", "text": "買牛奶", "completed": false, "createdAt": "2025-11-30T10:00:00.000Z" },
                { "id": "test-2", "text": "買豆漿", "completed": false, "createdAt": "2025-11-30T11:00:00.000Z" }
            ],
            "filter": "all"
        },
        "version": 1
    });
    let mut store = TodoStore::open(MemoryStateStorage::with_slot(
        STATE_STORAGE_KEY,
        payload.to_string(),
    ));

    assert_eq!(store.total_count(), 2);
    assert_eq!(store.tasks()[0].id, TaskId::from("test-1"));
    assert_eq!(store.tasks()[1].id.as_str(), "test-2");

    store.toggle(&TaskId::from("test-2"));
    let written = stored_payload(store.storage());
    assert_eq!(written["state"]["tasks"][1]["id"], "test-2");
    assert_eq!(written["state"]["tasks"][1]["completed"], true);
}

#[test]
fn payload_with_empty_id_fails_closed() {
    let payload = json!({
        "state": {
            "tasks": [
                { "id": "", "text": "a", "completed": false, "createdAt": "2025-11-30T10:00:00.000Z" }
            ],
            "filter": "all"
        },
        "version": 1
    });
    let store = TodoStore::open(MemoryStateStorage::with_slot(
        STATE_STORAGE_KEY,
        payload.to_string(),
    ));

    assert_eq!(store.total_count(), 0);
}

#[test]
fn rehydrate_restores_filter() {
    let payload = json!({ "state": { "tasks": [], "filter": "completed" }, "version": 1 });
    let store = TodoStore::open(MemoryStateStorage::with_slot(
        STATE_STORAGE_KEY,
        payload.to_string(),
    ));

    assert_eq!(store.filter(), TaskFilter::Completed);
}

#[test]
fn missing_slot_yields_empty_state() {
    let store = TodoStore::open(MemoryStateStorage::new());
    assert!(store.tasks().is_empty());
    assert_eq!(store.filter(), TaskFilter::All);
}

#[test]
fn corrupt_slot_fails_closed() {
    let storage = MemoryStateStorage::with_slot(STATE_STORAGE_KEY, "invalid json");
    let store = TodoStore::open(storage);

    assert!(store.tasks().is_empty());
    assert_eq!(store.filter(), TaskFilter::All);
}

#[test]
fn payload_breaking_invariants_fails_closed() {
    let duplicate = json!({
        "state": {
            "tasks": [
                { "id": "00000000-0000-4000-8000-000000000001", "text": "a", "completed": false, "createdAt": "2025-11-30T10:00:00.000Z" },
                { "id": "00000000-0000-4000-8000-000000000001", "text": "b", "completed": false, "createdAt": "2025-11-30T10:00:01.000Z" }
            ],
            "filter": "active"
        },
        "version": 1
    });
    let store = TodoStore::open(MemoryStateStorage::with_slot(
        STATE_STORAGE_KEY,
        duplicate.to_string(),
    ));

    assert!(store.tasks().is_empty());
    assert_eq!(store.filter(), TaskFilter::All);
}

#[test]
fn round_trip_preserves_tasks_and_filter() {
    let storage = MemoryStateStorage::new();
    let mut store = TodoStore::open(&storage);
    store.add("one");
    store.add("two");
    let second = store.tasks()[1].id.clone();
    store.toggle(&second);
    store.set_filter(TaskFilter::Active);
    let expected = store.state().clone();

    let reopened = TodoStore::open(&storage);
    assert_eq!(reopened.state(), &expected);
}

#[test]
fn explicit_rehydrate_discards_unpersisted_view() {
    let storage = MemoryStateStorage::new();
    let mut store = TodoStore::open(&storage);
    store.add("kept");

    storage
        .write_slot(
            STATE_STORAGE_KEY,
            &json!({ "state": { "tasks": [], "filter": "all" }, "version": 1 }).to_string(),
        )
        .unwrap();
    store.rehydrate();

    assert!(store.tasks().is_empty());
}

#[test]
fn sqlite_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.db");

    let expected = {
        let conn = open_db(&path).unwrap();
        let mut store = TodoStore::open(SqliteStateStorage::try_new(&conn).unwrap());
        store.add("persisted");
        store.add("done");
        let done = store.tasks()[1].id.clone();
        store.toggle(&done);
        store.set_filter(TaskFilter::Completed);
        store.state().clone()
    };

    let conn = open_db(&path).unwrap();
    let store = TodoStore::open(SqliteStateStorage::try_new(&conn).unwrap());
    assert_eq!(store.state(), &expected);
}

#[test]
fn sqlite_storage_upserts_a_single_row() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStateStorage::try_new(&conn).unwrap();

    storage.write_slot(STATE_STORAGE_KEY, "first").unwrap();
    storage.write_slot(STATE_STORAGE_KEY, "second").unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        storage.read_slot(STATE_STORAGE_KEY).unwrap().as_deref(),
        Some("second")
    );

    storage.remove_slot(STATE_STORAGE_KEY).unwrap();
    assert_eq!(storage.read_slot(STATE_STORAGE_KEY).unwrap(), None);
}

#[test]
fn sqlite_corrupt_slot_fails_closed() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStateStorage::try_new(&conn).unwrap();
    storage.write_slot(STATE_STORAGE_KEY, "{\"state\":").unwrap();

    let store = TodoStore::open(storage);
    assert!(store.tasks().is_empty());
    assert_eq!(store.filter(), TaskFilter::All);
}

#[test]
fn sqlite_storage_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteStateStorage::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn sqlite_storage_rejects_connection_without_slot_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteStateStorage::try_new(&conn),
        Err(RepoError::MissingRequiredTable("kv_slots"))
    ));
}

struct FailingStorage;

impl StateStorage for FailingStorage {
    fn read_slot(&self, _key: &str) -> todo_core::RepoResult<Option<String>> {
        Err(RepoError::MissingRequiredTable("kv_slots"))
    }

    fn write_slot(&self, _key: &str, _value: &str) -> todo_core::RepoResult<()> {
        Err(RepoError::MissingRequiredTable("kv_slots"))
    }

    fn remove_slot(&self, _key: &str) -> todo_core::RepoResult<()> {
        Ok(())
    }
}

#[test]
fn storage_failures_never_surface_to_callers() {
    let mut store = TodoStore::open(FailingStorage);
    store.add("still works");
    let id = store.tasks()[0].id.clone();
    store.toggle(&id);

    assert_eq!(store.tasks().len(), 1);
    assert!(store.tasks()[0].completed);
}
