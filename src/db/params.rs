//! Bound parameter sets.
//!
//! A [`Params`] value is an ordered list of `(key, value)` pairs where the key
//! is either a zero-based position (bound to the n-th anonymous `?` marker) or
//! a name (bound to `:name`, `@name` or `$name`). Setting an existing key
//! replaces its value in place, so merge order decides which value wins while
//! the original insertion position is kept.

use serde_json::{Map, Value};
use std::fmt;

/// Key of a bound parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    /// Zero-based position among the statement's anonymous markers.
    Index(usize),
    /// Name without its `:`/`@`/`$` prefix.
    Name(String),
}

impl ParamKey {
    /// Interpret a mapping key: purely numeric keys are positional.
    pub fn parse(key: &str) -> Self {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = key.parse() {
                return ParamKey::Index(index);
            }
        }
        ParamKey::Name(key.trim_start_matches([':', '@', '$']).to_string())
    }

    /// Whether this key is positional.
    pub const fn is_positional(&self) -> bool {
        matches!(self, ParamKey::Index(_))
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(index) => write!(f, "{}", index),
            ParamKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(key: &str) -> Self {
        ParamKey::parse(key)
    }
}

impl From<String> for ParamKey {
    fn from(key: String) -> Self {
        ParamKey::parse(&key)
    }
}

/// Ordered set of bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Value)>,
}

impl Params {
    /// An empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional parameters, in order.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut params = Self::new();
        for value in values {
            params.push(value);
        }
        params
    }

    /// Builder-style [`Params::set`].
    #[must_use]
    pub fn bind(mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append a positional value after the last positional key.
    pub fn push(&mut self, value: impl Into<Value>) {
        let next = self
            .entries
            .iter()
            .filter_map(|(k, _)| match k {
                ParamKey::Index(i) => Some(i + 1),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.entries.push((ParamKey::Index(next), value.into()));
    }

    /// Merge `other` into `self`; values from `other` win on key collision.
    pub fn merge(&mut self, other: &Params) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// A copy of `self` with `other` merged over it.
    #[must_use]
    pub fn merged(&self, other: &Params) -> Params {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Look up a value by key.
    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is bound.
    pub fn contains(&self, key: &ParamKey) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::new()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::positional(values)
    }
}

impl From<&Map<String, Value>> for Params {
    fn from(map: &Map<String, Value>) -> Self {
        let mut params = Params::new();
        for (key, value) in map {
            params.set(key.as_str(), value.clone());
        }
        params
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::from(&map)
    }
}

impl From<&Params> for Params {
    fn from(params: &Params) -> Self {
        params.clone()
    }
}

/// Arrays become positional, objects named, `null` empty and any other
/// scalar a single positional value.
impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Params::new(),
            Value::Array(values) => Params::positional(values),
            Value::Object(map) => Params::from(map),
            scalar => Params::positional([scalar]),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<ParamKey>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        let mut params = Params::new();
        for (key, value) in pairs {
            params.set(key, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (ParamKey, Value);
    type IntoIter = std::slice::Iter<'a, (ParamKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
