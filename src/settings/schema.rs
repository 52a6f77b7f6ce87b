//! Settings schema definitions.
//!
//! `RegistrySettings` is what a [`crate::Config`] is constructed from.
//! The other types describe the settings file read by the `hotconf`
//! binary. All types derive Serde traits for deserialization.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::partial::Partial;
use crate::settings::validation::ValidationError;
use crate::source::{EnvSource, PartialSource, Source};

/// Root settings for the `hotconf` binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Registry behaviour.
    pub registry: RegistrySettings,

    /// Logging and metrics.
    pub observability: ObservabilitySettings,

    /// Sources registered at startup.
    pub sources: Vec<SourceSettings>,

    /// Paths whose changes are logged.
    pub observe: Vec<String>,
}

/// Settings passed to [`crate::Config::new`].
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RegistrySettings {
    /// Interval between reload checks in milliseconds. `None` disables
    /// periodic reloading.
    pub observe_interval_ms: Option<u64>,
}

impl RegistrySettings {
    pub fn with_observe_interval(interval: Duration) -> Self {
        Self {
            observe_interval_ms: Some(interval.as_millis() as u64),
        }
    }

    pub fn observe_interval(&self) -> Option<Duration> {
        self.observe_interval_ms.map(Duration::from_millis)
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Colored output.
    pub ansi: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Kind of a source declared in the settings file.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Values written inline in the settings file.
    #[default]
    Inline,
    /// Explicit path → environment variable mappings.
    Env,
    /// Every variable under a prefix.
    EnvPrefix,
}

/// A source declared in the settings file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Unique source id.
    pub id: String,

    /// Higher priority wins on conflicting paths.
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub kind: SourceKind,

    /// Tree used by `inline` sources.
    #[serde(default)]
    pub values: Option<Partial>,

    /// Path → variable pairs used by `env` sources.
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,

    /// Variable prefix used by `env_prefix` sources.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Segment separator used by `env_prefix` sources.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "__".to_string()
}

impl SourceSettings {
    /// Check the fields the declared kind needs without touching the environment.
    pub fn check(&self) -> Result<(), ValidationError> {
        let field = match self.kind {
            SourceKind::Inline if self.values.is_none() => "values",
            SourceKind::Env if self.mappings.is_empty() => "mappings",
            SourceKind::EnvPrefix if self.prefix.is_none() => "prefix",
            _ => return Ok(()),
        };
        Err(ValidationError::MissingField {
            id: self.id.clone(),
            field,
        })
    }

    /// Instantiate the declared source.
    pub fn build(&self) -> Result<Arc<dyn Source>, ValidationError> {
        self.check()?;
        let source: Arc<dyn Source> = match self.kind {
            SourceKind::Inline => {
                Arc::new(PartialSource::new(self.values.clone().unwrap_or_default()))
            }
            SourceKind::Env => Arc::new(EnvSource::new(self.mappings.clone())),
            SourceKind::EnvPrefix => Arc::new(EnvSource::with_prefix(
                self.prefix.clone().unwrap_or_default(),
                self.separator.clone(),
            )),
        };
        Ok(source)
    }
}
