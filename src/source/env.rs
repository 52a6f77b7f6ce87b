//! Environment variable source.
//!
//! # Mapping Modes
//! ```text
//! Explicit:  [("server.port", "APP_PORT")]  → APP_PORT=80   ⇒ server.port = "80"
//! Prefix:    ("APP", "__")                  → APP__DB__HOST ⇒ db.host = "..."
//! ```
//!
//! # Design Decisions
//! - Values stay strings; no guessing of numbers or booleans
//! - Unset variables are left out of the tree
//! - Names or values that are not valid UTF-8 are skipped
//! - Reload re-reads the environment and compares snapshots

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::SourceError;
use crate::partial::Partial;
use crate::source::{ObservableSource, Source};

#[derive(Debug, Clone)]
enum Mapping {
    Explicit(Vec<(String, String)>),
    Prefix { prefix: String, separator: String },
}

/// A source reading its content from environment variables.
#[derive(Debug)]
pub struct EnvSource {
    mapping: Mapping,
    current: ArcSwap<Partial>,
}

impl EnvSource {
    /// Map explicit `(path, variable)` pairs.
    pub fn new<P, V>(mappings: impl IntoIterator<Item = (P, V)>) -> Self
    where
        P: Into<String>,
        V: Into<String>,
    {
        let mapping = Mapping::Explicit(
            mappings
                .into_iter()
                .map(|(p, v)| (p.into(), v.into()))
                .collect(),
        );
        Self::from_mapping(mapping)
    }

    /// Map every variable starting with `prefix` + `separator`.
    ///
    /// The remainder is lowercased and split on `separator` to form the path.
    pub fn with_prefix(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::from_mapping(Mapping::Prefix {
            prefix: prefix.into(),
            separator: separator.into(),
        })
    }

    fn from_mapping(mapping: Mapping) -> Self {
        let partial = read(&mapping);
        Self {
            mapping,
            current: ArcSwap::from_pointee(partial),
        }
    }
}

fn read(mapping: &Mapping) -> Partial {
    let mut partial = Partial::new();
    match mapping {
        Mapping::Explicit(pairs) => {
            for (path, var) in pairs {
                if let Ok(value) = std::env::var(var) {
                    partial.set(path, value);
                }
            }
        }
        Mapping::Prefix { prefix, separator } => {
            let head = format!("{}{}", prefix, separator);
            for (name, value) in std::env::vars_os() {
                let (Ok(name), Ok(value)) = (name.into_string(), value.into_string()) else {
                    continue;
                };
                let Some(rest) = name.strip_prefix(&head) else {
                    continue;
                };
                let path = rest
                    .split(separator.as_str())
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join(".");
                partial.set(&path, value);
            }
        }
    }
    partial
}

impl Source for EnvSource {
    fn partial(&self) -> Arc<Partial> {
        self.current.load_full()
    }

    fn as_observable(&self) -> Option<&dyn ObservableSource> {
        Some(self)
    }
}

impl ObservableSource for EnvSource {
    fn reload(&self) -> Result<bool, SourceError> {
        let fresh = read(&self.mapping);
        if *self.current.load_full() == fresh {
            return Ok(false);
        }
        tracing::debug!(entries = fresh.len(), "Environment source content changed");
        self.current.store(Arc::new(fresh));
        Ok(true)
    }
}
