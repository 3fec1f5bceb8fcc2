//! Data access: a statement-caching query executor over a SQL driver.
//!
//! [`Db`] wraps a [`Driver`] (SQLite by default) and adds:
//! - rewriting of legacy `%s`/`%d`/`%F` markers into `?` ([`placeholder`])
//! - remembered parameter sets on prepared [`Statement`]s
//! - [`ExecutionStats`] updated by every query
//! - the read fetchers `get_var`, `get_row`, `get_col` and `get_results`
//! - a request-scoped result cache keyed by [`Fingerprint`] ([`cache`])
//! - CRUD helpers ([`crud`]) and a schema loader ([`schema`])
//!
//! A `Db` is meant to live for one unit of work (one request, one CLI
//! invocation). Nothing it caches outlives it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use quillkit::db::Db;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), quillkit::db::DbError> {
//! let mut db = Db::open_in_memory()?;
//! db.load_schema("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")?;
//! db.query("INSERT INTO users (name) VALUES (%s)", vec![json!("ada")])?;
//!
//! let name = db.get_var("SELECT name FROM users WHERE id = %d", vec![json!(1)])?;
//! assert_eq!(name, Some(json!("ada")));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod crud;
pub mod driver;
pub mod error;
pub mod params;
pub mod placeholder;
pub mod schema;

pub use cache::{FetchMethod, Fetched, Fingerprint, Row, StatementCache};
pub use crud::params_to_sql;
pub use driver::{Driver, DriverError, Outcome, SqliteDriver};
pub use error::DbError;
pub use params::{ParamKey, Params};

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseOptions;

/// Path understood as "private in-memory database".
pub const MEMORY_PATH: &str = ":memory:";

/// Normalized SQL with a remembered parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub(crate) sql: String,
    pub(crate) params: Params,
}

impl Statement {
    /// Normalized SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters remembered for every execution of this statement.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Input accepted by [`Db::prepare`] and [`Db::query`].
#[derive(Debug, Clone)]
pub enum Query {
    /// Raw SQL, normalized and prepared on use.
    Sql(String),
    /// An already prepared statement; only its parameters are merged.
    Prepared(Statement),
}

impl From<&str> for Query {
    fn from(sql: &str) -> Self {
        Query::Sql(sql.to_string())
    }
}

impl From<String> for Query {
    fn from(sql: String) -> Self {
        Query::Sql(sql)
    }
}

impl From<&String> for Query {
    fn from(sql: &String) -> Self {
        Query::Sql(sql.clone())
    }
}

impl From<Statement> for Query {
    fn from(statement: Statement) -> Self {
        Query::Prepared(statement)
    }
}

impl From<&Statement> for Query {
    fn from(statement: &Statement) -> Self {
        Query::Prepared(statement.clone())
    }
}

/// A statement after execution, with any rows it produced.
#[derive(Debug, Clone)]
pub struct Executed {
    pub statement: Statement,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Executed {
    fn record(&self, values: &[Value]) -> Row {
        self.columns.iter().cloned().zip(values.iter().cloned()).collect()
    }

    /// Every row keyed by column name.
    pub fn records(&self) -> Vec<Row> {
        self.rows.iter().map(|values| self.record(values)).collect()
    }
}

/// Counters updated by every executed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    /// Statements executed (or attempted) since the `Db` was created.
    pub num_queries: usize,
    /// SQL text of each executed statement, in order.
    pub queries: Vec<String>,
    /// Rows returned by the last fetcher; reset to 0 by every query.
    pub num_rows: usize,
    /// Rows changed by the last data-modifying statement.
    pub rows_affected: usize,
    /// Row id reported by the driver after the last statement.
    pub insert_id: i64,
    /// Message of the most recent prepare/execute failure, cleared on success.
    pub last_error: Option<String>,
}

/// Query executor with placeholder normalization, statistics and a result cache.
#[derive(Debug)]
pub struct Db<D: Driver = SqliteDriver> {
    driver: D,
    cache: StatementCache,
    stats: ExecutionStats,
}

impl Db<SqliteDriver> {
    /// Open (or create) a SQLite database file; `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let driver = if path == Path::new(MEMORY_PATH) {
            SqliteDriver::open_in_memory()
        } else {
            SqliteDriver::open(path)
        }
        .map_err(|source| DbError::Open {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Opened database {}", path.display());
        Ok(Self::new(driver))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::open(MEMORY_PATH)
    }

    /// Open the configured database and load its schema, if any.
    pub fn from_options(options: &DatabaseOptions) -> Result<Self, DbError> {
        let path = options.path.clone().unwrap_or_else(|| PathBuf::from(MEMORY_PATH));
        let mut db = Self::open(&path)?;
        if let Some(schema) = &options.schema {
            db.load_schema(schema)?;
        }
        Ok(db)
    }
}

impl<D: Driver> Db<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            cache: StatementCache::new(),
            stats: ExecutionStats::default(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Cache `(hits, misses)`.
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats()
    }

    /// Drop every cached result.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Turn `query` into a [`Statement`] and merge `params` into its
    /// remembered parameters (supplied values win).
    ///
    /// Raw SQL has its legacy placeholders normalized and is compiled by the
    /// driver so syntax errors surface here. Prepared statements pass through
    /// untouched apart from the parameter merge.
    pub fn prepare(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Statement, DbError> {
        let params = params.into();
        let mut statement = match query.into() {
            Query::Prepared(statement) => statement,
            Query::Sql(raw) => {
                let sql = placeholder::normalize_placeholders(&raw);
                if let Err(source) = self.driver.prepare(&sql) {
                    let err = DbError::Prepare {
                        sql,
                        source,
                    };
                    return Err(self.record_failure(err));
                }
                Statement {
                    sql,
                    params: Params::new(),
                }
            }
        };
        statement.params.merge(&params);
        Ok(statement)
    }

    /// Execute `query` with `params` merged over any remembered parameters.
    ///
    /// Updates [`ExecutionStats`]: the query count and log, `num_rows` (reset
    /// to 0), `rows_affected` and `insert_id`. A driver failure is returned as
    /// [`DbError::Execution`] and recorded in `last_error`.
    pub fn query(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Executed, DbError> {
        let params = params.into();
        let mut statement = self.prepare(query, ())?;
        statement.params.merge(&params);

        self.stats.num_queries += 1;
        self.stats.queries.push(statement.sql.clone());
        self.stats.num_rows = 0;
        tracing::debug!("Executing query: {} ({} params)", statement.sql, statement.params.len());

        match self.driver.execute(&statement.sql, &statement.params) {
            Ok(outcome) => {
                self.stats.rows_affected = outcome.rows_affected;
                self.stats.insert_id = self.driver.last_insert_id();
                self.stats.last_error = None;
                Ok(Executed {
                    statement,
                    columns: outcome.columns,
                    rows: outcome.rows,
                })
            }
            Err(source) => {
                self.stats.rows_affected = 0;
                let err = DbError::Execution {
                    sql: statement.sql,
                    source,
                };
                Err(self.record_failure(err))
            }
        }
    }

    fn record_failure(&mut self, err: DbError) -> DbError {
        let message = err.detailed();
        tracing::warn!("{}", message);
        self.stats.last_error = Some(message);
        err
    }

    /// First column of the first row; `None` when there are no rows or the
    /// value is SQL `NULL`.
    pub fn get_var(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Option<Value>, DbError> {
        self.get_var_at(query, params, 0)
    }

    /// Column `column` of the first row.
    pub fn get_var_at(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
        column: usize,
    ) -> Result<Option<Value>, DbError> {
        let executed = self.query(query, params)?;
        let value = executed
            .rows
            .first()
            .and_then(|row| row.get(column))
            .filter(|value| !value.is_null())
            .cloned();
        self.stats.num_rows = usize::from(value.is_some());
        Ok(value)
    }

    /// First row keyed by column name.
    pub fn get_row(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Option<Row>, DbError> {
        let executed = self.query(query, params)?;
        let row = executed.rows.first().map(|values| executed.record(values));
        self.stats.num_rows = usize::from(row.is_some());
        Ok(row)
    }

    /// First column across all rows.
    pub fn get_col(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Vec<Value>, DbError> {
        self.get_col_at(query, params, 0)
    }

    /// Column `column` across all rows.
    pub fn get_col_at(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
        column: usize,
    ) -> Result<Vec<Value>, DbError> {
        let executed = self.query(query, params)?;
        let values: Vec<Value> =
            executed.rows.iter().filter_map(|row| row.get(column).cloned()).collect();
        self.stats.num_rows = values.len();
        Ok(values)
    }

    /// Every row keyed by column name.
    pub fn get_results(
        &mut self,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Vec<Row>, DbError> {
        let executed = self.query(query, params)?;
        let rows = executed.records();
        self.stats.num_rows = rows.len();
        Ok(rows)
    }

    /// Run the read fetcher named by `method`.
    pub fn fetch(
        &mut self,
        method: FetchMethod,
        query: impl Into<Query>,
        params: impl Into<Params>,
    ) -> Result<Fetched, DbError> {
        Ok(match method {
            FetchMethod::GetVar => Fetched::Var(self.get_var(query, params)?),
            FetchMethod::GetRow => Fetched::Row(self.get_row(query, params)?),
            FetchMethod::GetCol => Fetched::Col(self.get_col(query, params)?),
            FetchMethod::GetResults => Fetched::Results(self.get_results(query, params)?),
        })
    }

    /// Cached read: run `method` once per distinct (SQL, method, params) and
    /// return the stored result on every later call.
    ///
    /// `method` must name one of the four read fetchers, otherwise
    /// [`DbError::InvalidArgument`] is returned. `expiry` is accepted but not
    /// enforced; entries live as long as this `Db`.
    pub fn cache(
        &mut self,
        method: &str,
        query: impl Into<Query>,
        params: impl Into<Params>,
        expiry: Option<Duration>,
    ) -> Result<Arc<Fetched>, DbError> {
        let method: FetchMethod = method.parse()?;
        self.cache_with(method, query, params, expiry)
    }

    /// [`Db::cache`] with an already parsed fetch method.
    pub fn cache_with(
        &mut self,
        method: FetchMethod,
        query: impl Into<Query>,
        params: impl Into<Params>,
        expiry: Option<Duration>,
    ) -> Result<Arc<Fetched>, DbError> {
        let params = params.into();
        let (sql, all_params) = match query.into() {
            Query::Sql(raw) => (placeholder::normalize_placeholders(&raw), params),
            Query::Prepared(statement) => {
                let merged = statement.params.merged(&params);
                (statement.sql, merged)
            }
        };
        if let Some(expiry) = expiry {
            tracing::trace!("Cache expiry of {:?} requested; entries live for the session", expiry);
        }

        let key = Fingerprint::compute(&sql, method, &all_params);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {} {} ({})", method, sql, key);
            return Ok(hit);
        }

        tracing::debug!("Cache miss for {} {} ({})", method, sql, key);
        let fetched = Arc::new(self.fetch(method, sql, all_params)?);
        self.cache.insert(key, Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Run a schema, given as literal SQL or (when it contains no whitespace)
    /// as a path to a file holding it.
    ///
    /// Statements run in order; the first failure stops the load and is
    /// reported with its one-based position. Returns the number of statements
    /// executed.
    pub fn load_schema(&mut self, source: &str) -> Result<usize, DbError> {
        let text = if source.chars().any(char::is_whitespace) {
            source.to_string()
        } else {
            let path = PathBuf::from(source);
            tracing::debug!("Reading schema from {}", path.display());
            fs::read_to_string(&path).map_err(|source| DbError::SchemaRead {
                path,
                source,
            })?
        };

        let statements = schema::split_statements(&text);
        for (index, sql) in statements.iter().enumerate() {
            self.query(sql, ()).map_err(|err| DbError::SchemaStatement {
                index: index + 1,
                source: Box::new(err),
            })?;
        }
        tracing::debug!("Loaded schema ({} statements)", statements.len());
        Ok(statements.len())
    }
}
