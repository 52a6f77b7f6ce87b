//! Hierarchical value tree with dotted-path addressing.
//!
//! # Path Resolution
//! ```text
//! "server.tls.cert"
//!     → split on '.' (empty segments ignored, "" is the root)
//!     → every non-final segment must hold a nested tree
//!     → final segment may hold any value
//! ```
//!
//! # Design Decisions
//! - `Null` leaves behave as missing for lookups, but `has` sees the key
//! - Typed accessors return `PartialError` instead of panicking
//! - A default only rescues a missing value, never a mismatched one
//! - Merge is right-biased and recursive; scalars replace whole subtrees

pub mod value;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PartialError;

pub use value::Value;

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// A (possibly partial) configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partial {
    entries: BTreeMap<String, Value>,
}

impl Partial {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top level keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Top level entries, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a path without cloning. The inner `None` is the root.
    fn resolve(&self, path: &str) -> Option<Option<&Value>> {
        let segs: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = segs.split_last() else {
            return Some(None);
        };

        let mut current = self;
        for seg in parents {
            match current.entries.get(*seg) {
                Some(Value::Partial(child)) => current = child,
                _ => return None,
            }
        }
        current.entries.get(*last).map(Some)
    }

    /// Check whether the path fully resolves.
    pub fn has(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// Return the value at the path, if any.
    ///
    /// The empty path returns the whole tree. `Null` leaves read as `None`.
    pub fn get(&self, path: &str) -> Option<Value> {
        match self.resolve(path)? {
            None => Some(Value::Partial(self.clone())),
            Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        }
    }

    /// Return the value at the path, or `default` when missing.
    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    fn typed<T>(
        &self,
        path: &str,
        default: Option<T>,
        expected: &'static str,
        convert: impl FnOnce(Value) -> Option<T>,
    ) -> Result<T, PartialError> {
        match self.get(path) {
            None => default.ok_or_else(|| PartialError::Missing {
                path: path.to_string(),
            }),
            Some(value) => {
                let found = value.kind();
                convert(value).ok_or_else(|| PartialError::TypeMismatch {
                    path: path.to_string(),
                    expected,
                    found,
                })
            }
        }
    }

    pub fn bool(&self, path: &str) -> Result<bool, PartialError> {
        self.typed(path, None, "a boolean", |v| v.as_bool())
    }

    pub fn bool_or(&self, path: &str, default: bool) -> Result<bool, PartialError> {
        self.typed(path, Some(default), "a boolean", |v| v.as_bool())
    }

    pub fn int(&self, path: &str) -> Result<i64, PartialError> {
        self.typed(path, None, "an integer", |v| v.as_i64())
    }

    pub fn int_or(&self, path: &str, default: i64) -> Result<i64, PartialError> {
        self.typed(path, Some(default), "an integer", |v| v.as_i64())
    }

    /// Integers are accepted and widened.
    pub fn float(&self, path: &str) -> Result<f64, PartialError> {
        self.typed(path, None, "a float", |v| v.as_f64())
    }

    pub fn float_or(&self, path: &str, default: f64) -> Result<f64, PartialError> {
        self.typed(path, Some(default), "a float", |v| v.as_f64())
    }

    pub fn string(&self, path: &str) -> Result<String, PartialError> {
        self.typed(path, None, "a string", into_string)
    }

    pub fn string_or(
        &self,
        path: &str,
        default: impl Into<String>,
    ) -> Result<String, PartialError> {
        self.typed(path, Some(default.into()), "a string", into_string)
    }

    pub fn list(&self, path: &str) -> Result<Vec<Value>, PartialError> {
        self.typed(path, None, "a list", into_list)
    }

    pub fn list_or(&self, path: &str, default: Vec<Value>) -> Result<Vec<Value>, PartialError> {
        self.typed(path, Some(default), "a list", into_list)
    }

    /// Subtree at the path. The empty path returns a copy of the whole tree.
    pub fn partial(&self, path: &str) -> Result<Partial, PartialError> {
        self.typed(path, None, "a tree", into_partial)
    }

    pub fn partial_or(&self, path: &str, default: Partial) -> Result<Partial, PartialError> {
        self.typed(path, Some(default), "a tree", into_partial)
    }

    /// Deserialize the value at the path into `T`.
    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> Result<T, PartialError> {
        match self.get(path) {
            Some(value) => deserialize(path, &value),
            None => Err(PartialError::Missing {
                path: path.to_string(),
            }),
        }
    }

    /// Like [`Partial::populate`], with `default` covering a missing value.
    pub fn populate_or<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<T, PartialError> {
        match self.get(path) {
            Some(value) => deserialize(path, &value),
            None => Ok(default),
        }
    }

    /// Store a value at the path, creating intermediate trees as needed.
    ///
    /// Scalars sitting on the way are replaced by trees. Setting the root
    /// only accepts a tree; anything else is ignored.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        let segs: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = segs.split_last() else {
            if let Value::Partial(tree) = value {
                *self = tree;
            }
            return;
        };

        let mut current = self;
        for seg in parents {
            current = current.child_mut(seg);
        }
        current.entries.insert(last.to_string(), value);
    }

    fn child_mut(&mut self, key: &str) -> &mut Partial {
        let entry = self.entries.entry(key.to_string()).or_default();
        if !matches!(entry, Value::Partial(_)) {
            *entry = Value::Partial(Partial::new());
        }
        match entry {
            Value::Partial(child) => child,
            _ => unreachable!("entry was just replaced by a tree"),
        }
    }

    /// Remove and return the value at the path.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segs: Vec<&str> = segments(path).collect();
        let (last, parents) = segs.split_last()?;

        let mut current = self;
        for seg in parents {
            current = match current.entries.get_mut(*seg) {
                Some(Value::Partial(child)) => child,
                _ => return None,
            };
        }
        current.entries.remove(*last)
    }

    /// Deep right-biased merge, returning a new tree.
    pub fn merge(&self, other: &Partial) -> Partial {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    /// In-place form of [`Partial::merge`].
    pub fn merge_from(&mut self, other: &Partial) {
        for (key, value) in &other.entries {
            if let (Some(Value::Partial(left)), Value::Partial(right)) =
                (self.entries.get_mut(key), value)
            {
                left.merge_from(right);
                continue;
            }
            self.entries.insert(key.clone(), value.clone());
        }
    }
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn into_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::List(l) => Some(l),
        _ => None,
    }
}

fn into_partial(value: Value) -> Option<Partial> {
    match value {
        Value::Partial(p) => Some(p),
        _ => None,
    }
}

fn deserialize<T: DeserializeOwned>(path: &str, value: &Value) -> Result<T, PartialError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|source| PartialError::Populate {
            path: path.to_string(),
            source,
        })
}

impl From<BTreeMap<String, Value>> for Partial {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Partial {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl TryFrom<serde_json::Value> for Partial {
    type Error = PartialError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Partial(tree) => Ok(tree),
            other => Err(PartialError::TypeMismatch {
                path: String::new(),
                expected: "a tree",
                found: other.kind(),
            }),
        }
    }
}
