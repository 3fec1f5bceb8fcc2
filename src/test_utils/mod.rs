//! Test utilities for quillkit
//!
//! Helpers shared by unit and integration tests: logging setup, scratch
//! sites with templates and themes, and in-memory databases.
//!
//! # Example
//!
//! ```rust,no_run
//! use quillkit::test_utils::TestSite;
//! use serde_json::Map;
//!
//! let site = TestSite::builder()
//!     .unwrap()
//!     .with_file("hello.tpl", "Hello {{ who }}")
//!     .build()
//!     .unwrap();
//! let html = site.view().render("hello", Map::new(), false);
//! ```

pub mod builder;

pub use builder::{TestSite, TestSiteBuilder};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::db::{Db, DbError};

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off.
///
/// ```bash
/// RUST_LOG=quillkit=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// An in-memory database with `schema` loaded.
pub fn memory_db(schema: &str) -> Result<Db, DbError> {
    let mut db = Db::open_in_memory()?;
    if !schema.trim().is_empty() {
        db.load_schema(schema)?;
    }
    Ok(db)
}

/// `users(id, name, age)` with three rows, used across the test suites.
pub const USERS_SCHEMA: &str = "
CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);
INSERT INTO users (name, age) VALUES ('alice', 30);
INSERT INTO users (name, age) VALUES ('bob', 25);
INSERT INTO users (name, age) VALUES ('carol', NULL);
";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn test_memory_db_loads_schema() {
        init_test_logging(None);
        let mut db = memory_db(USERS_SCHEMA).unwrap();
        assert_eq!(db.get_var("SELECT COUNT(*) FROM users", ()).unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_site_builder_writes_files() {
        let site = TestSite::builder()
            .unwrap()
            .with_file("pages/a.tpl", "A {{ x }}")
            .with_settings("[app]\nenv = \"prod\"\n")
            .build()
            .unwrap();

        assert!(site.path().join("pages/a.tpl").is_file());
        assert_eq!(site.settings_path, site.path().join("quillkit.toml"));
        assert_eq!(site.read("pages/a.tpl").unwrap(), "A {{ x }}");
        assert_eq!(site.settings().unwrap().app_config()["env"], json!("prod"));

        let mut data = Map::new();
        data.insert("x".into(), json!(1));
        assert_eq!(site.view().render("pages/a", data, false).unwrap(), "A 1");
    }
}
