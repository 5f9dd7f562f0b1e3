use pinboard_core::db::schema::{schema_version, stored_version};
use pinboard_core::db::{open_db, DbError};
use pinboard_core::{KvStore, SqliteKvStore};
use rusqlite::Connection;

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pinboard.sqlite3");

    let first = SqliteKvStore::open(&path).unwrap();
    first.set("pinned_board_notes_v1", "[]").unwrap();
    drop(first);

    let second = SqliteKvStore::open(&path).unwrap();
    assert_eq!(
        second.get("pinned_board_notes_v1").unwrap().as_deref(),
        Some("[]")
    );
}

#[test]
fn open_db_applies_latest_schema() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("schema.sqlite3")).unwrap();
    assert_eq!(stored_version(&conn).unwrap(), schema_version());

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 42);
            assert_eq!(supported, schema_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}
