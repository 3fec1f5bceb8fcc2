//! SQL driver abstraction and the SQLite implementation.
//!
//! [`crate::db::Db`] owns a value implementing [`Driver`] rather than being a
//! driver type itself. The trait covers exactly what the executor needs:
//! compiling a statement, executing it with a parameter set, and reading the
//! last insert id.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{CachedStatement, Connection};
use serde_json::{Number, Value};
use std::path::Path;

use super::params::{ParamKey, Params};

/// Error type reported by drivers.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Column names, empty for statements that return no rows.
    pub columns: Vec<String>,
    /// Fetched rows, each in column order.
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a data-modifying statement.
    pub rows_affected: usize,
}

/// A connection the executor can drive.
pub trait Driver {
    /// Compile `sql` without executing it, surfacing syntax errors early.
    fn prepare(&mut self, sql: &str) -> Result<(), DriverError>;

    /// Execute `sql` with `params` bound and collect any rows.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Outcome, DriverError>;

    /// Row id of the most recent successful insert.
    fn last_insert_id(&self) -> i64;
}

/// [`Driver`] over a [`rusqlite::Connection`].
///
/// Compiled statements are kept in rusqlite's per-connection statement cache,
/// so repeated queries skip re-parsing.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
        }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Driver for SqliteDriver {
    fn prepare(&mut self, sql: &str) -> Result<(), DriverError> {
        self.conn.prepare_cached(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<Outcome, DriverError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        bind_params(&mut stmt, params)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        if columns.is_empty() {
            let rows_affected = stmt.raw_execute()?;
            return Ok(Outcome {
                columns,
                rows: Vec::new(),
                rows_affected,
            });
        }

        let mut fetched = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(json_from_sql(row.get_ref(index)?));
            }
            fetched.push(values);
        }

        Ok(Outcome {
            columns,
            rows: fetched,
            rows_affected: 0,
        })
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

/// Bind every parameter, positional keys to anonymous `?` markers in order
/// and named keys to `:name`, `@name` or `$name`.
fn bind_params(stmt: &mut CachedStatement<'_>, params: &Params) -> Result<(), DriverError> {
    let anonymous: Vec<usize> =
        (1..=stmt.parameter_count()).filter(|&i| stmt.parameter_name(i).is_none()).collect();

    for (key, value) in params.iter() {
        let index = match key {
            ParamKey::Index(position) => anonymous.get(*position).copied().ok_or_else(|| {
                format!(
                    "Positional parameter {} has no matching '?' marker ({} available)",
                    position,
                    anonymous.len()
                )
            })?,
            ParamKey::Name(name) => named_index(stmt, name)?
                .ok_or_else(|| format!("Statement has no parameter named ':{}'", name))?,
        };
        stmt.raw_bind_parameter(index, sql_from_json(value))?;
    }
    Ok(())
}

fn named_index(stmt: &CachedStatement<'_>, name: &str) -> Result<Option<usize>, DriverError> {
    for prefix in [':', '@', '$'] {
        if let Some(index) = stmt.parameter_index(&format!("{}{}", prefix, name))? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn sql_from_json(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}
