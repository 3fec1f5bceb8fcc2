//! Functions callable from templates.
//!
//! | Function                              | Result                                   |
//! |---------------------------------------|------------------------------------------|
//! | `data(key, clean="html")`             | view data or `config.*` value, escaped   |
//! | `url(path, time=<url_time>)`          | URL for an asset, or `null` for inline   |
//! | `clean(value, mode="html")`           | escaped value                            |
//! | `queue(type, content, deps=[])`       | id of the queued asset                   |
//! | `dequeue(type, id)`                   | `null`                                   |
//! | `tpl(name, data={})`                  | rendered partial                         |
//!
//! Tera passes arguments by name, e.g. `{{ data(key="user.name") }}` or
//! `{% set _ = queue(type="css", content="/app.css") %}`.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tera::Tera;

use super::View;
use crate::core::{CleanMode, UrlOptions};

type Args = HashMap<String, Value>;

/// Register every view function on `tera`, bound to `view`.
pub(crate) fn register(tera: &mut Tera, view: &View) {
    let v = view.clone();
    tera.register_function("data", move |args: &Args| -> tera::Result<Value> {
        let key = required_str(args, "data", "key")?;
        let mode = mode_arg(args, "clean")?;
        Ok(v.data(&key, mode).unwrap_or(Value::Null))
    });

    let v = view.clone();
    tera.register_function("url", move |args: &Args| -> tera::Result<Value> {
        let path = required_str(args, "url", "path")?;
        let time = match args.get("time") {
            Some(Value::Bool(time)) => Some(*time),
            Some(other) => {
                return Err(tera::Error::msg(format!(
                    "Function `url` expects `time` to be a boolean, got {}",
                    other
                )));
            }
            None => None,
        };
        let opts = time.map(|time| UrlOptions {
            time,
        });
        Ok(v.url(&path, opts).map_or(Value::Null, Value::String))
    });

    let v = view.clone();
    tera.register_function("clean", move |args: &Args| -> tera::Result<Value> {
        let value = args.get("value").cloned().unwrap_or(Value::Null);
        let mode = mode_arg(args, "mode")?;
        Ok(v.clean(value, mode))
    });

    let v = view.clone();
    tera.register_function("queue", move |args: &Args| -> tera::Result<Value> {
        let kind = required_str(args, "queue", "type")?;
        let content = required_str(args, "queue", "content")?;
        let deps = match args.get("deps") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                items.iter().filter_map(|item| item.as_str().map(String::from)).collect()
            }
            Some(Value::String(single)) => vec![single.clone()],
            Some(other) => {
                return Err(tera::Error::msg(format!(
                    "Function `queue` expects `deps` to be a list of ids, got {}",
                    other
                )));
            }
        };
        let id = v.queue(&kind, &content, deps).map_err(|e| tera::Error::msg(e.to_string()))?;
        Ok(Value::String(id))
    });

    let v = view.clone();
    tera.register_function("dequeue", move |args: &Args| -> tera::Result<Value> {
        let kind = required_str(args, "dequeue", "type")?;
        let id = required_str(args, "dequeue", "id")?;
        v.dequeue(&kind, &id).map_err(|e| tera::Error::msg(e.to_string()))?;
        Ok(Value::Null)
    });

    let v = view.clone();
    tera.register_function("tpl", move |args: &Args| -> tera::Result<Value> {
        let name = required_str(args, "tpl", "name")?;
        let data = match args.get("data") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(tera::Error::msg(format!(
                    "Function `tpl` expects `data` to be an object, got {}",
                    other
                )));
            }
        };
        let html = v.render(&name, data, false).map_err(|e| tera::Error::msg(e.to_string()))?;
        Ok(Value::String(html))
    });
}

fn required_str(args: &Args, function: &str, name: &str) -> tera::Result<String> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(tera::Error::msg(format!(
            "Function `{}` expects `{}` to be a string, got {}",
            function, name, other
        ))),
        None => Err(tera::Error::msg(format!(
            "Function `{}` is missing the `{}` argument",
            function, name
        ))),
    }
}

fn mode_arg(args: &Args, name: &str) -> tera::Result<CleanMode> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(CleanMode::default()),
        Some(Value::Bool(false)) => Ok(CleanMode::Raw),
        Some(Value::String(mode)) => mode.parse().map_err(tera::Error::msg),
        Some(other) => Err(tera::Error::msg(format!("Invalid clean mode {}", other))),
    }
}
