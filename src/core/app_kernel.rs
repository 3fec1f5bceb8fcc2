//! A configuration-driven [`Kernel`] implementation.
//!
//! [`AppKernel`] is what the CLI and the test helpers hand to the data and
//! view layers. It answers configuration lookups from a JSON tree, resolves
//! names against an ordered list of search roots, distinguishes URLs from
//! inline content, escapes values and runs named output filters.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use super::kernel::{CleanMode, Kernel, UrlOptions};
use crate::config::Settings;
use crate::utils::escape;

/// A filter registered with [`AppKernel::on`].
pub type EventFilter = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Default [`Kernel`] backed by settings and in-process event filters.
pub struct AppKernel {
    config: Value,
    search_paths: Vec<PathBuf>,
    filters: HashMap<String, Vec<EventFilter>>,
}

impl fmt::Debug for AppKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppKernel")
            .field("config", &self.config)
            .field("search_paths", &self.search_paths)
            .field("events", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AppKernel {
    /// Create a kernel from a configuration tree and search roots.
    ///
    /// A non-object `config` is replaced by an empty mapping.
    pub fn new(config: Value, search_paths: Vec<PathBuf>) -> Self {
        let config = if config.is_object() {
            config
        } else {
            Value::Object(Map::new())
        };
        Self {
            config,
            search_paths,
            filters: HashMap::new(),
        }
    }

    /// Create a kernel from parsed [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.app_config(), settings.search_paths.clone())
    }

    /// Register a filter for the event `name`.
    ///
    /// Filters run in registration order, each receiving the previous one's
    /// output.
    pub fn on<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filters.entry(name.into()).or_default().push(Box::new(filter));
        self
    }

    /// Builder-style variant of [`AppKernel::on`].
    #[must_use]
    pub fn with_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.on(name, filter);
        self
    }

    /// Set a (possibly dotted) configuration key, creating nested tables.
    pub fn set_config(&mut self, key: &str, value: Value) {
        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut node = &mut self.config;
        for part in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = match node {
                Value::Object(map) => {
                    map.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()))
                }
                _ => return,
            };
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert(last.to_string(), value);
        }
    }

    fn base_url(&self) -> String {
        self.config
            .get("base_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return candidate.exists().then(|| candidate.to_path_buf());
        }
        self.search_paths.iter().map(|root| root.join(candidate)).find(|path| path.exists())
    }
}

/// Whether `content` can only be inline CSS/JS rather than a URL or file name.
fn is_inline_content(content: &str) -> bool {
    content.is_empty()
        || content.chars().any(char::is_whitespace)
        || content.contains(['<', '{', ';', '('])
}

fn is_remote_url(content: &str) -> bool {
    content.starts_with("http://") || content.starts_with("https://") || content.starts_with("//")
}

fn modified_secs(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_secs())
}

fn clean_value(value: Value, mode: CleanMode) -> Value {
    match value {
        Value::String(s) => Value::String(escape::escape(&s, mode)),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| clean_value(item, mode)).collect())
        }
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, clean_value(v, mode))).collect())
        }
        other => other,
    }
}

impl Kernel for AppKernel {
    fn config(&self, key: Option<&str>) -> Option<Value> {
        let Some(key) = key else {
            return Some(self.config.clone());
        };
        if let Some(value) = self.config.get(key) {
            return Some(value.clone());
        }
        let mut node = &self.config;
        for part in key.split('.') {
            node = node.get(part)?;
        }
        Some(node.clone())
    }

    fn path(&self, name: &str) -> Option<PathBuf> {
        let resolved = self.resolve(name);
        tracing::trace!("path({}) -> {:?}", name, resolved);
        resolved
    }

    fn url(&self, content: &str, opts: &UrlOptions) -> Option<String> {
        let content = content.trim();
        if is_inline_content(content) {
            return None;
        }
        if is_remote_url(content) {
            return Some(content.to_string());
        }

        let local = self.resolve(content.trim_start_matches('/'));
        let mut url = if content.starts_with('/') {
            content.to_string()
        } else if local.is_some() && Path::new(content).extension().is_some() {
            format!("{}/{}", self.base_url(), content)
        } else {
            return None;
        };

        if opts.time {
            if let Some(mtime) = local.as_deref().and_then(modified_secs) {
                let sep = if url.contains('?') { '&' } else { '?' };
                url.push_str(&format!("{}v={}", sep, mtime));
            }
        }
        Some(url)
    }

    fn clean(&self, value: Value, mode: CleanMode) -> Value {
        clean_value(value, mode)
    }

    fn event(&self, name: &str, payload: Value) -> Value {
        match self.filters.get(name) {
            Some(filters) => {
                tracing::debug!("Running {} filter(s) for event '{}'", filters.len(), name);
                filters.iter().fold(payload, |acc, filter| filter(acc))
            }
            None => payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn kernel() -> AppKernel {
        AppKernel::new(
            json!({
                "name": "Demo",
                "env": "dev",
                "base_url": "https://example.com/",
                "route": { "path": "/home" },
            }),
            vec![],
        )
    }

    #[test]
    fn test_config_lookup() {
        let k = kernel();
        assert_eq!(k.config(Some("env")), Some(json!("dev")));
        assert_eq!(k.config(Some("route.path")), Some(json!("/home")));
        assert_eq!(k.config(Some("route.missing")), None);
        assert_eq!(k.config(None).unwrap()["name"], "Demo");
    }

    #[test]
    fn test_set_config_nested() {
        let mut k = kernel();
        k.set_config("db.options.timeout", json!(5));
        k.set_config("env", json!("prod"));
        assert_eq!(k.config(Some("db.options.timeout")), Some(json!(5)));
        assert_eq!(k.config(Some("env")), Some(json!("prod")));
    }

    #[test]
    fn test_url_classification() {
        let k = kernel();
        let opts = UrlOptions::default();
        assert_eq!(k.url("/assets/app.min.css", &opts).as_deref(), Some("/assets/app.min.css"));
        assert_eq!(
            k.url("https://cdn.example.com/lib.js", &opts).as_deref(),
            Some("https://cdn.example.com/lib.js")
        );
        assert_eq!(k.url("body{color:red}", &opts), None);
        assert_eq!(k.url("console.log(1)", &opts), None);
        assert_eq!(k.url("missing.css", &opts), None);
    }

    #[test]
    fn test_url_local_file_gets_base_url_and_cache_buster() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("assets")).unwrap();
        std::fs::write(temp.path().join("assets/site.css"), "p{}").unwrap();
        let k = AppKernel::new(json!({"base_url": "https://example.com"}), vec![
            temp.path().to_path_buf(),
        ]);

        let plain = k.url("assets/site.css", &UrlOptions { time: false }).unwrap();
        assert_eq!(plain, "https://example.com/assets/site.css");

        let busted = k.url("assets/site.css", &UrlOptions::default()).unwrap();
        assert!(busted.starts_with("https://example.com/assets/site.css?v="));
    }

    #[test]
    fn test_path_search_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        std::fs::write(second.path().join("page.tpl"), "x").unwrap();
        let k = AppKernel::new(json!({}), vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);

        assert_eq!(k.path("page.tpl"), Some(second.path().join("page.tpl")));
        assert_eq!(k.path("nope.tpl"), None);
    }

    #[test]
    fn test_clean_recurses_into_containers() {
        let k = kernel();
        let cleaned = k.clean(json!({"a": "<b>", "list": ["&", 1, null]}), CleanMode::Html);
        assert_eq!(cleaned, json!({"a": "&lt;b&gt;", "list": ["&amp;", 1, null]}));
    }

    #[test]
    fn test_event_filters_chain() {
        let k = kernel()
            .with_filter("output.html", |v| json!(format!("{}!", v.as_str().unwrap_or_default())))
            .with_filter("output.html", |v| json!(v.as_str().unwrap_or_default().to_uppercase()));

        assert_eq!(k.event("output.html", json!("hi")), json!("HI!"));
        assert_eq!(k.event("other", json!("hi")), json!("hi"));
    }
}
