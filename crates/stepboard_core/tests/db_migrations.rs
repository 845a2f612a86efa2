use rusqlite::Connection;
use stepboard_core::db::migrations::latest_version;
use stepboard_core::db::{open_db, open_db_in_memory, open_db_with, DbError, DbOptions};
use stepboard_core::{RepoError, SqliteStepRepository};
use std::time::Duration;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "projects");
    assert_table_exists(&conn, "steps");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stepboard.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db_with(
        &path,
        &DbOptions {
            busy_timeout: Duration::from_millis(100),
        },
    )
    .unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "steps");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn step_position_uniqueness_is_enforced_by_storage() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO projects (uuid, title) VALUES ('p', 'Project');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO steps (uuid, project_uuid, title, detail, position)
         VALUES ('a', 'p', 'A', 'a', 1);",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO steps (uuid, project_uuid, title, detail, position)
             VALUES ('b', 'p', 'B', 'b', 1);",
            [],
        )
        .unwrap_err();
    assert!(DbError::from(err).is_unique_violation());
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteStepRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
