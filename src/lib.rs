//! Layered, hot-reloadable configuration store.
//!
//! Sources are folded by priority into one [`Partial`] tree, observable
//! sources are polled on an interval, and observers hear about value
//! changes on the paths they watch.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod partial;
pub mod settings;
pub mod source;
pub mod trigger;

pub use config::Config;
pub use error::{CallbackError, ConfigError, PartialError, SourceError, TriggerError};
pub use partial::{Partial, Value};
pub use settings::RegistrySettings;
pub use source::{ObservableSource, Source};
pub use trigger::Trigger;
