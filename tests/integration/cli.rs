//! The `quillkit` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use super::fixture_site;

fn quillkit() -> Command {
    let mut cmd = Command::cargo_bin("quillkit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A settings file whose in-memory database loads the fixture schema.
fn database_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let schema = fixture_site().join("schema.sql");
    let settings = format!("[database]\nschema = {:?}\n", schema.display().to_string());
    fs::write(temp.path().join("quillkit.toml"), settings).unwrap();
    temp
}

#[test]
fn test_render_primary_page() {
    let config = fixture_site().join("quillkit.toml");
    quillkit()
        .arg("--config")
        .arg(&config)
        .args(["render", "home", "--primary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Fixture Site</title>"))
        .stdout(predicate::str::contains("<link rel=\"stylesheet\" href=\"/assets/site.css\">"))
        .stdout(predicate::str::contains("<main>Welcome guest</main>"));
}

#[test]
fn test_render_with_data_file() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");
    fs::write(&data, r#"{"who": "Grace"}"#).unwrap();

    quillkit()
        .current_dir(fixture_site())
        .args(["render", "pages/home", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("<main>Welcome Grace</main>"))
        .stdout(predicate::str::contains("<link").not());
}

#[test]
fn test_render_missing_template_reports_suggestion() {
    quillkit()
        .current_dir(fixture_site())
        .args(["render", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template nope not found"))
        .stderr(predicate::str::contains("search_paths"));
}

#[test]
fn test_query_runs_against_configured_database() {
    let project = database_project();

    quillkit()
        .current_dir(project.path())
        .args(["query", "SELECT name FROM users WHERE id = %d", "--param", "1", "--method", "get_var"])
        .assert()
        .success()
        .stdout(predicate::str::diff("\"alice\"\n"));

    quillkit()
        .current_dir(project.path())
        .args(["query", "SELECT id, name FROM users ORDER BY id", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"id":1,"name":"alice"},{"id":2,"name":"bob"}]"#));
}

#[test]
fn test_query_named_parameter() {
    let project = database_project();

    quillkit()
        .current_dir(project.path())
        .args(["query", "SELECT bio FROM users WHERE name = :name", "--named", "name=alice"])
        .args(["--method", "get_col", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["likes ; semicolons"]"#));
}

#[test]
fn test_query_rejects_unknown_method() {
    quillkit()
        .args(["--config"])
        .arg(fixture_site().join("quillkit.toml"))
        .args(["query", "SELECT 1", "--method", "query"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn test_schema_command_reports_failing_statement() {
    let temp = TempDir::new().unwrap();

    quillkit()
        .current_dir(temp.path())
        .args(["schema", "CREATE TABLE a (x INT); INSERT INTO nope VALUES (1);"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("#2"));
}

#[test]
fn test_schema_command_applies_statements() {
    let temp = TempDir::new().unwrap();

    quillkit()
        .current_dir(temp.path())
        .args(["schema", "CREATE TABLE a (x INT); CREATE TABLE b (y INT);"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 statement(s)"));
}

#[test]
fn test_invalid_settings_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("quillkit.toml"), "[view]\ntemplat_ext = \"html\"\n").unwrap();

    quillkit()
        .current_dir(temp.path())
        .args(["render", "home"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid settings file"));
}
