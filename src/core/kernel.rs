//! The collaborator interface consumed by the data and view layers.
//!
//! Everything outside the core (configuration loading, path lookup, URL
//! generation, output escaping and event filters) reaches [`crate::db`] and
//! [`crate::templating`] through the [`Kernel`] trait. Components receive an
//! `Arc<dyn Kernel>` at construction time; nothing is looked up globally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Escaping strategy requested from [`Kernel::clean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// Escape for HTML text content.
    #[default]
    Html,
    /// Escape for a quoted HTML attribute value.
    Attr,
    /// Escape for embedding inside a JavaScript string literal.
    Js,
    /// Percent-encode reserved characters.
    Url,
    /// No escaping.
    Raw,
}

impl CleanMode {
    /// All recognised modes, in declaration order.
    pub const ALL: [CleanMode; 5] =
        [CleanMode::Html, CleanMode::Attr, CleanMode::Js, CleanMode::Url, CleanMode::Raw];

    /// The lowercase name used in templates and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            CleanMode::Html => "html",
            CleanMode::Attr => "attr",
            CleanMode::Js => "js",
            CleanMode::Url => "url",
            CleanMode::Raw => "raw",
        }
    }
}

impl fmt::Display for CleanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CleanMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown clean mode '{}'. Expected one of: {}",
                    s,
                    CleanMode::ALL.map(CleanMode::as_str).join(", ")
                )
            })
    }
}

/// Options forwarded to [`Kernel::url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOptions {
    /// Append a modification-time cache buster when the asset is a local file.
    pub time: bool,
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            time: true,
        }
    }
}

/// Narrow interface to the surrounding application.
///
/// The five operations are the only way the data-access and view layers talk
/// to configuration, the filesystem, URL generation, output escaping and the
/// event system.
pub trait Kernel: Send + Sync {
    /// Look up a configuration value.
    ///
    /// `None` returns the whole configuration mapping. Keys may be dotted
    /// (`route.path`) to reach into nested tables.
    fn config(&self, key: Option<&str>) -> Option<Value>;

    /// Resolve a relative name to the absolute path of an existing file.
    fn path(&self, name: &str) -> Option<PathBuf>;

    /// Turn `content` into a URL, or return `None` when it is inline content.
    fn url(&self, content: &str, opts: &UrlOptions) -> Option<String>;

    /// Escape every string leaf of `value` for the given output context.
    fn clean(&self, value: Value, mode: CleanMode) -> Value;

    /// Run the filters registered for `name` over `payload`.
    fn event(&self, name: &str, payload: Value) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_mode_parse() {
        assert_eq!("html".parse::<CleanMode>().unwrap(), CleanMode::Html);
        assert_eq!("JS".parse::<CleanMode>().unwrap(), CleanMode::Js);
        let err = "sql".parse::<CleanMode>().unwrap_err();
        assert!(err.contains("html, attr, js, url, raw"));
    }

    #[test]
    fn test_url_options_default_time() {
        assert!(UrlOptions::default().time);
    }
}
