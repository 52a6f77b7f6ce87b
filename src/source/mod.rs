//! Configuration sources.
//!
//! # Data Flow
//! ```text
//! external decoder / environment / code
//!     → Source (exposes an Arc<Partial>)
//!     → Config folds sources by priority
//!
//! On scheduled reload:
//!     Config asks each ObservableSource::reload()
//!     → Ok(true) means "content changed, rebuild"
//! ```
//!
//! # Design Decisions
//! - Sources hand out immutable `Arc<Partial>` snapshots
//! - Reload capability is optional and discovered via `as_observable`
//! - Sources never parse bytes; decoding stays outside the crate

pub mod aggregate;
pub mod env;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use crate::error::SourceError;
use crate::partial::{Partial, Value};

pub use aggregate::AggregateSource;
pub use env::EnvSource;
pub use memory::{MemorySource, PartialSource};

/// A provider of configuration content.
pub trait Source: Send + Sync + fmt::Debug {
    /// Current content of the source.
    fn partial(&self) -> Arc<Partial>;

    /// Check whether the path resolves in this source.
    fn has(&self, path: &str) -> bool {
        self.partial().has(path)
    }

    /// Value at the path in this source.
    fn get(&self, path: &str) -> Option<Value> {
        self.partial().get(path)
    }

    /// Release any resource held by the source.
    fn close(&self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Reload capability, when the source supports it.
    fn as_observable(&self) -> Option<&dyn ObservableSource> {
        None
    }
}

/// A source able to detect changes in its content.
pub trait ObservableSource: Source {
    /// Refresh the content, returning whether it changed.
    fn reload(&self) -> Result<bool, SourceError>;
}
