//! Query executor behavior against a real SQLite database.

use anyhow::Result;
use quillkit::db::{Db, DbError, FetchMethod, Fetched, Params};
use quillkit::test_utils::{USERS_SCHEMA, init_test_logging, memory_db};
use serde_json::json;

use super::fixture_site;

#[test]
fn test_legacy_placeholders_and_fetchers() -> Result<()> {
    init_test_logging(None);
    let mut db = memory_db(USERS_SCHEMA)?;

    let name = db.get_var("SELECT name FROM users WHERE age > %d ORDER BY age", vec![json!(26)])?;
    assert_eq!(name, Some(json!("alice")));

    let row = db.get_row("SELECT name, age FROM users WHERE name = %s", vec![json!("bob")])?;
    assert_eq!(row, Some(json!({"name": "bob", "age": 25}).as_object().cloned().unwrap()));

    let names = db.get_col("SELECT name FROM users ORDER BY id", ())?;
    assert_eq!(names, vec![json!("alice"), json!("bob"), json!("carol")]);
    assert_eq!(db.stats().num_rows, 3);

    let rows = db.get_results("SELECT id, age FROM users WHERE age IS NULL", ())?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["age"], json!(null));
    Ok(())
}

#[test]
fn test_named_parameters() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    let params = Params::new().bind("name", "carol");
    let id = db.get_var("SELECT id FROM users WHERE name = :name", params)?;
    assert_eq!(id, Some(json!(3)));
    Ok(())
}

#[test]
fn test_prepared_statement_is_reused_with_new_params() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    let statement = db.prepare("SELECT name FROM users WHERE id = :id", Params::new().bind("id", 1))?;

    assert_eq!(db.get_var(&statement, ())?, Some(json!("alice")));
    assert_eq!(db.get_var(&statement, Params::new().bind("id", 2))?, Some(json!("bob")));
    Ok(())
}

#[test]
fn test_statistics_track_every_query() -> Result<()> {
    let mut db = memory_db("")?;
    db.query("CREATE TABLE t (v INTEGER)", ())?;
    db.query("INSERT INTO t (v) VALUES (?)", vec![json!(1)])?;
    db.query("INSERT INTO t (v) VALUES (?)", vec![json!(2)])?;

    let stats = db.stats();
    assert_eq!(stats.num_queries, 3);
    assert_eq!(stats.queries.len(), 3);
    assert_eq!(stats.rows_affected, 1);
    assert_eq!(stats.insert_id, 2);
    assert!(stats.last_error.is_none());

    let err = db.query("INSERT INTO missing (v) VALUES (1)", ()).unwrap_err();
    assert!(matches!(err, DbError::Prepare { .. } | DbError::Execution { .. }));
    assert!(db.stats().last_error.as_deref().unwrap_or_default().contains("missing"));
    Ok(())
}

#[test]
fn test_cache_returns_stored_result() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;

    let first = db.cache("get_var", "SELECT COUNT(*) FROM users", (), None)?;
    assert_eq!(*first, Fetched::Var(Some(json!(3))));

    db.query("DELETE FROM users", ())?;
    let second = db.cache("get_var", "SELECT COUNT(*) FROM users", (), None)?;
    assert_eq!(*second, Fetched::Var(Some(json!(3))));

    let fresh = db.cache_with(FetchMethod::GetCol, "SELECT COUNT(*) FROM users", (), None)?;
    assert_eq!(*fresh, Fetched::Col(vec![json!(0)]));

    assert_eq!(db.cache_stats(), (1, 2));
    Ok(())
}

#[test]
fn test_cache_rejects_write_methods() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    let err = db.cache("query", "DELETE FROM users", (), None).unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(db.stats().num_queries, 4);
    assert_eq!(db.get_var("SELECT COUNT(*) FROM users", ())?, Some(json!(3)));
    Ok(())
}

#[test]
fn test_fixture_schema_file() -> Result<()> {
    let mut db = Db::open_in_memory()?;
    let schema = fixture_site().join("schema.sql");
    let count = db.load_schema(&schema.display().to_string())?;
    assert_eq!(count, 3);

    let bio = db.get_var("SELECT bio FROM users WHERE name = 'alice'", ())?;
    assert_eq!(bio, Some(json!("likes ; semicolons")));
    Ok(())
}

#[test]
fn test_schema_stops_at_first_failure() -> Result<()> {
    let mut db = Db::open_in_memory()?;
    let err = db
        .load_schema("CREATE TABLE a (x INT); INSERT INTO nope VALUES (1); CREATE TABLE b (y INT);")
        .unwrap_err();

    assert!(matches!(err, DbError::SchemaStatement { index: 2, .. }));
    assert_eq!(db.get_var("SELECT COUNT(*) FROM sqlite_master WHERE name = 'b'", ())?, Some(json!(0)));
    Ok(())
}

#[test]
fn test_file_database_persists() -> Result<()> {
    let temp = tempfile::TempDir::new()?;
    let path = temp.path().join("app.db");

    {
        let mut db = Db::open(&path)?;
        db.load_schema(USERS_SCHEMA)?;
    }

    let mut db = Db::open(&path)?;
    assert_eq!(db.get_var("SELECT COUNT(*) FROM users", ())?, Some(json!(3)));
    Ok(())
}
