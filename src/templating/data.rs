//! Dot-path lookups into view data.
//!
//! `user.address.city` walks nested objects (and array indices such as
//! `items.0.title`). A leading `config` segment switches to the kernel's
//! configuration, so `config.env` reads the environment regardless of what
//! the view data contains. Any missing segment resolves to `None`.

use serde_json::{Map, Value};

use crate::core::{CleanMode, Kernel};

/// Root segment that redirects lookups into configuration.
pub const CONFIG_ROOT: &str = "config";

/// Read-only resolver over one view-data snapshot.
pub struct DataResolver<'a> {
    kernel: &'a dyn Kernel,
    data: &'a Map<String, Value>,
}

impl<'a> DataResolver<'a> {
    pub fn new(kernel: &'a dyn Kernel, data: &'a Map<String, Value>) -> Self {
        Self {
            kernel,
            data,
        }
    }

    /// Resolve `path` without cleaning.
    pub fn resolve(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;

        if first == CONFIG_ROOT {
            let config = self.kernel.config(None)?;
            return walk(&config, segments).cloned();
        }

        let root = self.data.get(first)?;
        walk(root, segments).cloned()
    }

    /// Resolve `path` and pass a non-null result through the kernel's
    /// escaping with `mode`.
    pub fn data(&self, path: &str, mode: CleanMode) -> Option<Value> {
        match self.resolve(path) {
            Some(Value::Null) | None => None,
            Some(value) => Some(self.kernel.clean(value, mode)),
        }
    }
}

fn walk<'v, 's>(mut node: &'v Value, segments: impl Iterator<Item = &'s str>) -> Option<&'v Value> {
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}
