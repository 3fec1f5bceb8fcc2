//! TOML configuration parsing with file path context.

use anyhow::{Context, Result};
use std::path::Path;

use super::Settings;

/// Parse a TOML configuration file into the specified type.
///
/// Errors carry the file path, both for read failures and for parse
/// failures:
///
/// ```text
/// Failed to parse config file: /path/to/quillkit.toml
/// Caused by:
///     unknown field `templat_ext`, expected one of `template_ext`, ...
/// ```
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Load [`Settings`] and resolve relative paths against the file's directory.
///
/// Relative `search_paths`, `database.path` and schema file entries are
/// interpreted relative to the directory containing the settings file, so a
/// project can be rendered from any working directory. When no search paths
/// are configured the settings directory itself is used. A schema containing
/// whitespace is literal SQL and is left alone.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings: Settings = parse_config(path)?;
    let base = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

    if settings.search_paths.is_empty() {
        settings.search_paths.push(base.to_path_buf());
    } else {
        settings.search_paths = settings
            .search_paths
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { base.join(p) })
            .collect();
    }

    if let Some(db_path) = settings.database.path.take() {
        let is_memory = db_path.as_os_str() == ":memory:";
        settings.database.path =
            Some(if is_memory || db_path.is_absolute() { db_path } else { base.join(db_path) });
    }

    if let Some(schema) = settings.database.schema.take() {
        let is_file = !schema.chars().any(char::is_whitespace) && Path::new(&schema).is_relative();
        settings.database.schema =
            Some(if is_file { base.join(&schema).display().to_string() } else { schema });
    }

    tracing::debug!(
        "Loaded settings from {} ({} search path(s))",
        path.display(),
        settings.search_paths.len()
    );

    Ok(settings)
}
