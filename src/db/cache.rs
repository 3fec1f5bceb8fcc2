//! Request-scoped result cache for read queries.
//!
//! Results are keyed by a [`Fingerprint`] over the normalized SQL text, the
//! read fetcher used, and every bound parameter. The cache lives exactly as
//! long as the [`crate::db::Db`] that owns it; nothing is persisted or shared.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::error::DbError;
use super::params::Params;

/// A fetched row keyed by column name.
pub type Row = Map<String, Value>;

/// Marker every cacheable method name starts with.
pub const READ_METHOD_PREFIX: &str = "get_";

/// The read fetchers whose results may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMethod {
    /// First column of the first row.
    GetVar,
    /// First row as a keyed record.
    GetRow,
    /// One column across all rows.
    GetCol,
    /// Every row as keyed records.
    GetResults,
}

impl FetchMethod {
    pub const ALL: [FetchMethod; 4] =
        [FetchMethod::GetVar, FetchMethod::GetRow, FetchMethod::GetCol, FetchMethod::GetResults];

    pub const fn as_str(self) -> &'static str {
        match self {
            FetchMethod::GetVar => "get_var",
            FetchMethod::GetRow => "get_row",
            FetchMethod::GetCol => "get_col",
            FetchMethod::GetResults => "get_results",
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMethod {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FetchMethod::ALL.into_iter().find(|method| method.as_str() == s).ok_or_else(|| {
            let reason = if s.starts_with(READ_METHOD_PREFIX) {
                "is not a known read fetcher"
            } else {
                "is not a read method"
            };
            DbError::InvalidArgument {
                message: format!(
                    "Cache method '{}' {}; must be one of get_var, get_row, get_col or get_results",
                    s, reason
                ),
            }
        })
    }
}

/// Result of a read fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fetched {
    Var(Option<Value>),
    Row(Option<Row>),
    Col(Vec<Value>),
    Results(Vec<Row>),
}

impl Fetched {
    pub fn as_var(&self) -> Option<&Value> {
        match self {
            Fetched::Var(value) => value.as_ref(),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Fetched::Row(row) => row.as_ref(),
            _ => None,
        }
    }

    pub fn as_col(&self) -> Option<&[Value]> {
        match self {
            Fetched::Col(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_results(&self) -> Option<&[Row]> {
        match self {
            Fetched::Results(rows) => Some(rows),
            _ => None,
        }
    }

    /// Convert into a plain JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Fetched::Var(value) => value.unwrap_or(Value::Null),
            Fetched::Row(row) => row.map_or(Value::Null, Value::Object),
            Fetched::Col(values) => Value::Array(values),
            Fetched::Results(rows) => Value::Array(rows.into_iter().map(Value::Object).collect()),
        }
    }
}

/// SHA-256 over a query's SQL, fetch method and bound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint.
    ///
    /// Parts are separated by a unit separator byte so that adjacent fields
    /// cannot run into each other (`"ab" + "c"` vs `"a" + "bc"`). Keys carry
    /// a positional/named tag and values are hashed in their JSON form, so
    /// `1`, `"1"`, `null` and `"null"` all produce different fingerprints.
    pub fn compute(sql: &str, method: FetchMethod, params: &Params) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(method.as_str().as_bytes());
        for (key, value) in params.iter() {
            hasher.update(b"\x1f");
            hasher.update(if key.is_positional() { b"#" } else { b":" });
            hasher.update(key.to_string().as_bytes());
            hasher.update(b"\x1e");
            hasher.update(value.to_string().as_bytes());
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory map from fingerprint to fetched result.
#[derive(Debug, Default)]
pub struct StatementCache {
    entries: HashMap<Fingerprint, Arc<Fetched>>,
    hits: usize,
    misses: usize,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a result, counting the hit or miss.
    pub fn get(&mut self, key: &Fingerprint) -> Option<Arc<Fetched>> {
        if let Some(result) = self.entries.get(key) {
            self.hits += 1;
            Some(Arc::clone(result))
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, key: Fingerprint, result: Arc<Fetched>) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached results and reset statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// `(hits, misses)` since creation or the last [`StatementCache::clear`].
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
