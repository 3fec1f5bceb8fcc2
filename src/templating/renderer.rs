//! Template execution for [`View`].
//!
//! Each render builds a fresh Tera instance holding the requested template,
//! the theme's function templates and the view functions, then renders it
//! against a snapshot of the view data.

use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tera::{Context, Tera};

use super::error::ViewError;
use super::theme::ThemePlan;
use super::{AssetQueue, View, functions};
use crate::core::{CleanMode, Kernel};

/// Nested `tpl()` calls deeper than this fail instead of recursing forever.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Event filter applied to the final HTML of primary renders.
pub const OUTPUT_EVENT: &str = "output.html";

/// Closing tag the head markup is inserted before.
const HEAD_CLOSE: &str = "</head>";

/// Configuration values copied into the `js` bucket, with their keys.
const JS_CONFIG_KEYS: [(&str, &str); 4] =
    [("base_url", "baseUrl"), ("env", "env"), ("name", "name"), ("route.path", "route")];

/// Environment in which pages are indexable by default.
const PRODUCTION_ENV: &str = "prod";

/// Append `.{ext}` to names without an extension.
pub fn with_default_extension(name: &str, ext: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{}.{}", name, ext)
    }
}

/// Seed the `js` and `meta` buckets of a primary render's data.
///
/// Whitelisted configuration values are copied into `js`, and
/// `meta.noindex` defaults to `true` outside production.
pub fn seed_primary_data(kernel: &dyn Kernel, data: &mut Map<String, Value>) {
    for bucket in ["js", "meta"] {
        let slot = data.entry(bucket).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
    }

    if let Some(Value::Object(js)) = data.get_mut("js") {
        for (config_key, js_key) in JS_CONFIG_KEYS {
            match kernel.config(Some(config_key)) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    js.insert(js_key.to_string(), value);
                }
            }
        }
    }

    let is_prod = kernel.config(Some("env")).as_ref().and_then(Value::as_str) == Some(PRODUCTION_ENV);
    if let Some(Value::Object(meta)) = data.get_mut("meta") {
        if !meta.contains_key("noindex") && !is_prod {
            meta.insert("noindex".to_string(), Value::Bool(true));
        }
    }
}

/// Queued asset markup followed by the page-data script when `js` is not
/// empty.
pub fn head_markup(kernel: &dyn Kernel, assets: &AssetQueue, js: &Value, var: &str) -> String {
    let mut head = assets.emit();
    let has_js = match js {
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
        _ => true,
    };
    if has_js {
        let cleaned = kernel.clean(js.clone(), CleanMode::Html);
        let json = serde_json::to_string(&cleaned).unwrap_or_else(|_| "{}".to_string());
        head.push_str(&format!("<script>window.{} = {};</script>\n", var, json));
    }
    head
}

/// Insert `head` right before the first `</head>`; no-op without one.
pub fn inject_head(html: &str, head: &str) -> String {
    if head.is_empty() {
        return html.to_string();
    }
    html.replacen(HEAD_CLOSE, &format!("{}{}", head, HEAD_CLOSE), 1)
}

struct DepthGuard<'a>(&'a View);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.shared.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

impl View {
    /// Render `name` and return the HTML.
    ///
    /// With `primary` set this is a full page render (theme layout, head
    /// injection and the `output.html` filter). Otherwise `name` is rendered
    /// as a partial.
    pub fn render(
        &self,
        name: &str,
        mut data: Map<String, Value>,
        primary: bool,
    ) -> Result<String, ViewError> {
        let depth = self.shared.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = DepthGuard(self);
        if depth > MAX_INCLUDE_DEPTH {
            return Err(ViewError::Render {
                template: name.to_string(),
                message: format!("Maximum include depth ({}) exceeded", MAX_INCLUDE_DEPTH),
            });
        }

        let theme = if primary {
            self.theme()?
        } else {
            self.active_theme()
        };
        let (template_name, path) = self.resolve_template(name, primary, theme.as_deref())?;
        tracing::debug!("Rendering {} from {}", template_name, path.display());

        if primary {
            seed_primary_data(self.kernel(), &mut data);
        }
        let js = data.get("js").cloned().unwrap_or(Value::Null);

        let snapshot = {
            let mut state = self.state();
            state.data.extend(data);
            state
                .data
                .entry("template")
                .or_insert_with(|| Value::String(name.to_string()));
            state.data.clone()
        };

        let source = fs::read_to_string(&path).map_err(|source| ViewError::Io {
            path: path.clone(),
            source,
        })?;
        let tera = self.build_tera(&template_name, &source, theme.as_deref())?;
        let context = Context::from_value(Value::Object(snapshot))
            .map_err(|e| ViewError::from_tera(&template_name, &e))?;
        let html =
            tera.render(&template_name, &context).map_err(|e| ViewError::from_tera(&template_name, &e))?;

        if !primary {
            return Ok(html);
        }

        let head = head_markup(self.kernel(), &self.assets(), &js, &self.shared.options.page_data_var);
        let page = inject_head(&html, &head);
        match self.kernel().event(OUTPUT_EVENT, Value::String(page.clone())) {
            Value::String(filtered) => Ok(filtered),
            other => {
                tracing::warn!("{} filter returned a non-string value ({}); ignoring it", OUTPUT_EVENT, other);
                Ok(page)
            }
        }
    }

    /// Render `name` and write the result to `out`.
    pub fn tpl<W: Write + ?Sized>(
        &self,
        name: &str,
        data: Map<String, Value>,
        primary: bool,
        out: &mut W,
    ) -> Result<(), ViewError> {
        let html = self.render(name, data, primary)?;
        out.write_all(html.as_bytes()).map_err(ViewError::Write)?;
        out.flush().map_err(ViewError::Write)
    }

    /// The Tera name and absolute path of the template to run.
    fn resolve_template(
        &self,
        name: &str,
        primary: bool,
        theme: Option<&ThemePlan>,
    ) -> Result<(String, PathBuf), ViewError> {
        if primary {
            if let Some(theme) = theme {
                return Ok((self.shared.options.layout.clone(), theme.layout.clone()));
            }
        }

        let file_name = with_default_extension(name, &self.shared.options.template_ext);
        let path = self.kernel().path(&file_name).ok_or_else(|| ViewError::TemplateNotFound {
            name: name.to_string(),
        })?;
        Ok((file_name, path))
    }

    fn build_tera(
        &self,
        template_name: &str,
        source: &str,
        theme: Option<&ThemePlan>,
    ) -> Result<Tera, ViewError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        functions::register(&mut tera, self);

        let mut templates: Vec<(&str, &str)> = theme
            .map(|theme| {
                theme.functions.iter().map(|f| (f.name.as_str(), f.source.as_str())).collect()
            })
            .unwrap_or_default();
        templates.push((template_name, source));

        tera.add_raw_templates(templates).map_err(|e| ViewError::from_tera(template_name, &e))?;
        Ok(tera)
    }
}
