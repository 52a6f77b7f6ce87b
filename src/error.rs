//! Error types shared across the crate.
//!
//! # Taxonomy
//! - `PartialError`: lookups on a value tree (missing path, wrong type)
//! - `SourceError`: raised by source implementations on close/reload
//! - `TriggerError`: scheduling primitive could not start
//! - `ConfigError`: registry operations (duplicate/unknown ids, wrapped
//!   source or lookup failures)
//!
//! # Design Decisions
//! - Construction and lookup errors go back to the immediate caller
//! - Reload errors are logged by the registry, never returned
//! - A default value only covers absence, never a type mismatch

use thiserror::Error;

/// Error returned by a scheduled callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while reading typed values out of a [`crate::Partial`].
#[derive(Debug, Error)]
pub enum PartialError {
    /// Nothing resolved at the path and no default was given.
    #[error("no value found at path '{path}'")]
    Missing { path: String },

    /// A value resolved, but not of the requested kind.
    #[error("value at path '{path}' is {found}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The subtree could not be deserialized into the target type.
    #[error("unable to populate value from path '{path}': {source}")]
    Populate {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by [`crate::Source`] implementations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source was already closed.
    #[error("source is closed")]
    Closed,

    /// Content could not be refreshed.
    #[error("reload failed: {0}")]
    Reload(String),

    /// Any other implementation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Errors raised when a trigger cannot be scheduled.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Triggers run on Tokio and need a runtime to spawn on.
    #[error("no Tokio runtime available to schedule the trigger")]
    NoRuntime,
}

/// Errors raised by the configuration registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source with this id is already registered.
    #[error("duplicate source id '{0}'")]
    DuplicateSource(String),

    /// No source is registered under this id.
    #[error("unknown source id '{0}'")]
    UnknownSource(String),

    /// A registered source reported an error.
    #[error("source '{id}' failed: {source}")]
    Source {
        id: String,
        #[source]
        source: SourceError,
    },

    /// The periodic reload trigger could not be started.
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// A typed lookup on the merged tree failed.
    #[error(transparent)]
    Partial(#[from] PartialError),
}

/// Result alias for registry operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
