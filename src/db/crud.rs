//! SQL synthesis for common mutations.
//!
//! Table and column names are interpolated verbatim and must come from
//! trusted code; only values are bound as parameters.

use serde_json::{Map, Value};

use super::driver::Driver;
use super::error::DbError;
use super::params::{ParamKey, Params};
use super::Db;

/// The tautology emitted for an empty `AND`-joined condition list.
pub const MATCH_ALL: &str = "1=1";

/// Build a `key = placeholder` list joined by `sep`, collecting the values
/// into `output`.
///
/// Numeric keys produce an anonymous `?` marker and are appended to `output`
/// positionally. Other keys produce `:key`; when `output` already binds that
/// name (for example a column used both in `SET` and `WHERE`), a numbered
/// suffix keeps the placeholders distinct.
///
/// An empty input joined with an `AND` separator yields [`MATCH_ALL`] so the
/// surrounding `WHERE` clause stays valid and matches every row; with any
/// other separator it yields an empty string.
pub fn params_to_sql(data: &Map<String, Value>, sep: &str, output: &mut Params) -> String {
    let mut fragments = Vec::with_capacity(data.len());

    for (key, value) in data {
        match ParamKey::parse(key) {
            ParamKey::Index(_) => {
                fragments.push(format!("{} = ?", key));
                output.push(value.clone());
            }
            ParamKey::Name(name) => {
                let placeholder = unique_name(&name, output);
                fragments.push(format!("{} = :{}", key, placeholder));
                output.set(ParamKey::Name(placeholder), value.clone());
            }
        }
    }

    if fragments.is_empty() && sep.to_ascii_uppercase().contains("AND") {
        return MATCH_ALL.to_string();
    }
    fragments.join(sep)
}

fn unique_name(name: &str, taken: &Params) -> String {
    if !taken.contains(&ParamKey::Name(name.to_string())) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", name, n))
        .find(|candidate| !taken.contains(&ParamKey::Name(candidate.clone())))
        .unwrap_or_else(|| name.to_string())
}

fn insert_sql(verb: &str, table: &str, data: &Map<String, Value>) -> String {
    if data.is_empty() {
        return format!("{} INTO {} DEFAULT VALUES", verb, table);
    }
    let columns: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{}", c)).collect();
    format!("{} INTO {} ({}) VALUES ({})", verb, table, columns.join(", "), placeholders.join(", "))
}

impl<D: Driver> Db<D> {
    /// `INSERT` one row; returns the number of rows affected.
    pub fn insert(&mut self, table: &str, data: &Map<String, Value>) -> Result<usize, DbError> {
        self.write(insert_sql("INSERT", table, data), Params::from(data))
    }

    /// `REPLACE` one row (insert, or overwrite on unique-key conflict).
    pub fn replace(&mut self, table: &str, data: &Map<String, Value>) -> Result<usize, DbError> {
        self.write(insert_sql("REPLACE", table, data), Params::from(data))
    }

    /// `UPDATE` rows matching `conditions` with the values in `data`.
    ///
    /// An empty `conditions` mapping matches every row.
    pub fn update(
        &mut self,
        table: &str,
        data: &Map<String, Value>,
        conditions: &Map<String, Value>,
    ) -> Result<usize, DbError> {
        let mut params = Params::new();
        let set_sql = params_to_sql(data, ", ", &mut params);
        let where_sql = params_to_sql(conditions, " AND ", &mut params);
        self.write(format!("UPDATE {} SET {} WHERE {}", table, set_sql, where_sql), params)
    }

    /// `DELETE` rows matching `conditions`.
    ///
    /// An empty `conditions` mapping matches every row.
    pub fn delete(&mut self, table: &str, conditions: &Map<String, Value>) -> Result<usize, DbError> {
        let mut params = Params::new();
        let where_sql = params_to_sql(conditions, " AND ", &mut params);
        self.write(format!("DELETE FROM {} WHERE {}", table, where_sql), params)
    }

    fn write(&mut self, sql: String, params: Params) -> Result<usize, DbError> {
        self.query(sql, params)?;
        Ok(self.stats().rows_affected)
    }
}
