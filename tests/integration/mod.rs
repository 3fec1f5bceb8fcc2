//! Integration test suite for quillkit
//!
//! End-to-end tests of the public API and the `quillkit` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: the `quillkit` binary (`render`, `schema`, `query`) and its error output
//! - **crud**: insert/replace/update/delete helpers against SQLite
//! - **db**: placeholders, fetchers, statistics, the statement cache and schema loading
//! - **view**: themes, function templates, asset injection and output filters
//!
//! Fixture files live in `tests/fixtures/site`.

use std::path::PathBuf;

mod cli;
mod crud;
mod db;
mod view;

/// The fixture site shipped with the test suite.
pub fn fixture_site() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("site")
}
