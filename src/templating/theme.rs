//! Theme activation.
//!
//! When the configuration names a theme, primary renders use the theme's
//! layout instead of the requested template. The theme's functions directory
//! is scanned once, at activation, and every template file found there is
//! registered with each render under its path relative to the theme root
//! (`functions/forms.tpl`), so layouts can `{% import %}` macros from it.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::ViewError;
use crate::config::ViewOptions;
use crate::core::Kernel;

/// Directory holding themes when `modules_dir` is not configured.
pub const DEFAULT_MODULES_DIR: &str = "modules";

/// A template discovered under the theme's functions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTemplate {
    /// Name the template is registered under.
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Everything a primary render needs from the active theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePlan {
    pub name: String,
    pub root: PathBuf,
    pub layout: PathBuf,
    pub functions: Vec<FunctionTemplate>,
}

impl ThemePlan {
    /// Resolve the configured theme, if any.
    ///
    /// Returns `Ok(None)` when no theme is configured and
    /// [`ViewError::LayoutNotFound`] when the theme has no layout file.
    pub fn activate(kernel: &dyn Kernel, options: &ViewOptions) -> Result<Option<Self>, ViewError> {
        let Some(name) = config_str(kernel, "theme") else {
            return Ok(None);
        };
        let modules_dir =
            config_str(kernel, "modules_dir").unwrap_or_else(|| DEFAULT_MODULES_DIR.to_string());

        let layout_name = format!("{}/{}/{}", modules_dir.trim_end_matches('/'), name, options.layout);
        let layout = kernel.path(&layout_name).ok_or_else(|| ViewError::LayoutNotFound {
            theme: name.clone(),
            path: layout_name.clone(),
        })?;
        let root = layout.parent().map(Path::to_path_buf).unwrap_or_default();

        let functions = scan_functions(&root, &options.functions_dir, &options.template_ext)?;
        tracing::debug!(
            "Activated theme '{}' at {} ({} function templates)",
            name,
            root.display(),
            functions.len()
        );

        Ok(Some(Self {
            name,
            root,
            layout,
            functions,
        }))
    }
}

fn config_str(kernel: &dyn Kernel, key: &str) -> Option<String> {
    match kernel.config(Some(key))? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Collect every `*.{ext}` file under `root/functions_dir`, sorted by path.
fn scan_functions(
    root: &Path,
    functions_dir: &str,
    ext: &str,
) -> Result<Vec<FunctionTemplate>, ViewError> {
    let dir = root.join(functions_dir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut functions = Vec::new();
    for entry in WalkDir::new(&dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ViewError::ThemeScan {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let source = fs::read_to_string(path).map_err(|source| ViewError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!("Found theme function template {}", name);

        functions.push(FunctionTemplate {
            name,
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(functions)
}
