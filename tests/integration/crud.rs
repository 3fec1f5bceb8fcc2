//! CRUD helpers end to end.

use anyhow::Result;
use quillkit::db::{Params, params_to_sql};
use quillkit::test_utils::{USERS_SCHEMA, memory_db};
use serde_json::{Map, Value, json};

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_insert_update_delete_cycle() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;

    assert_eq!(db.insert("users", &map(json!({"name": "dave", "age": 41})))?, 1);
    let id = db.stats().insert_id;
    assert_eq!(id, 4);

    let changed = db.update("users", &map(json!({"age": 42})), &map(json!({"name": "dave"})))?;
    assert_eq!(changed, 1);
    assert_eq!(db.get_var("SELECT age FROM users WHERE id = ?", vec![json!(id)])?, Some(json!(42)));

    assert_eq!(db.delete("users", &map(json!({"name": "dave"})))?, 1);
    assert_eq!(db.get_var("SELECT COUNT(*) FROM users", ())?, Some(json!(3)));
    Ok(())
}

#[test]
fn test_update_without_conditions_touches_every_row() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    assert_eq!(db.update("users", &map(json!({"age": 1})), &Map::new())?, 3);
    assert_eq!(db.get_col("SELECT DISTINCT age FROM users", ())?, vec![json!(1)]);
    Ok(())
}

#[test]
fn test_replace_overwrites_by_primary_key() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    db.replace("users", &map(json!({"id": 2, "name": "robert", "age": 26})))?;

    assert_eq!(db.get_var("SELECT name FROM users WHERE id = 2", ())?, Some(json!("robert")));
    assert_eq!(db.get_var("SELECT COUNT(*) FROM users", ())?, Some(json!(3)));
    Ok(())
}

#[test]
fn test_same_column_in_data_and_conditions() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    let changed = db.update("users", &map(json!({"name": "alicia"})), &map(json!({"name": "alice"})))?;
    assert_eq!(changed, 1);
    assert_eq!(db.get_var("SELECT id FROM users WHERE name = 'alicia'", ())?, Some(json!(1)));
    Ok(())
}

#[test]
fn test_delete_reports_zero_for_no_match() -> Result<()> {
    let mut db = memory_db(USERS_SCHEMA)?;
    assert_eq!(db.delete("users", &map(json!({"name": "nobody"})))?, 0);
    Ok(())
}

#[test]
fn test_params_to_sql_fragments() {
    let mut params = Params::new();
    let sql = params_to_sql(&map(json!({"a": 1, "b": null})), " AND ", &mut params);
    assert_eq!(sql, "a = :a AND b = :b");
    assert_eq!(params.len(), 2);

    let mut params = Params::new();
    assert_eq!(params_to_sql(&Map::new(), " AND ", &mut params), "1=1");
    assert_eq!(params_to_sql(&Map::new(), ", ", &mut params), "");
}
