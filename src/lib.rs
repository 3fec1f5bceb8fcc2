//! quillkit - SQL access and template views for small web applications
//!
//! quillkit has two halves that share one collaborator, the [`core::Kernel`]:
//!
//! - a **data layer** ([`db`]): a query executor over SQLite that normalizes
//!   `%s`/`%d`/`%F` placeholders, remembers prepared parameters, tracks
//!   execution statistics, caches read results per (SQL, fetcher, params),
//!   builds CRUD statements from key/value maps and loads multi-statement
//!   schemas
//! - a **view layer** ([`templating`]): a Tera-based renderer with shared view
//!   data, themes and function templates, an asset queue emitted into the
//!   page head, and an `output.html` event filter
//!
//! # Modules
//!
//! - [`cli`] - the `quillkit` command-line interface
//! - [`config`] - TOML settings (`[app]`, `search_paths`, `[view]`, `[database]`)
//! - [`core`] - the [`core::Kernel`] trait, [`core::AppKernel`] and CLI error
//!   reporting
//! - [`db`] - [`db::Db`], [`db::StatementCache`], parameters and CRUD helpers
//! - [`templating`] - [`templating::View`], [`templating::AssetQueue`],
//!   [`templating::DataResolver`]
//! - [`utils`] - escaping helpers
//!
//! # Settings Format (quillkit.toml)
//!
//! ```toml
//! search_paths = ["site"]
//!
//! [app]
//! env = "dev"
//! name = "Demo"
//! base_url = "https://example.test"
//! theme = "default"
//!
//! [view]
//! template_ext = "tpl"
//! page_data_var = "pageData"
//!
//! [database]
//! path = "app.db"
//! schema = "schema.sql"
//! ```
//!
//! # Example
//!
//! ```rust
//! use quillkit::db::Db;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), quillkit::db::DbError> {
//! let mut db = Db::open_in_memory()?;
//! db.load_schema("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")?;
//! db.insert("users", json!({"name": "alice"}).as_object().unwrap())?;
//!
//! let name = db.get_var("SELECT name FROM users WHERE id = %d", vec![json!(1)])?;
//! assert_eq!(name, Some(json!("alice")));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
