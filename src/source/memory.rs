//! In-memory sources.
//!
//! - `PartialSource`: fixed content, never changes
//! - `MemorySource`: content replaced from code, reports the change on
//!   the next reload

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::SourceError;
use crate::partial::{Partial, Value};
use crate::source::{ObservableSource, Source};

/// A source with fixed content.
#[derive(Debug, Clone, Default)]
pub struct PartialSource {
    partial: Arc<Partial>,
}

impl PartialSource {
    pub fn new(partial: Partial) -> Self {
        Self {
            partial: Arc::new(partial),
        }
    }
}

impl Source for PartialSource {
    fn partial(&self) -> Arc<Partial> {
        self.partial.clone()
    }
}

/// A mutable in-memory source.
///
/// Updates are visible through `partial()` immediately; the registry picks
/// them up on its next reload.
#[derive(Debug, Default)]
pub struct MemorySource {
    current: ArcSwap<Partial>,
    dirty: AtomicBool,
    closed: AtomicBool,
}

impl MemorySource {
    pub fn new(partial: Partial) -> Self {
        Self {
            current: ArcSwap::from_pointee(partial),
            dirty: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the whole content.
    pub fn replace(&self, partial: Partial) {
        self.current.store(Arc::new(partial));
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Set a single path.
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        self.current.rcu(|current| {
            let mut next = Partial::clone(current);
            next.set(path, value.clone());
            next
        });
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Source for MemorySource {
    fn partial(&self) -> Arc<Partial> {
        self.current.load_full()
    }

    fn close(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn as_observable(&self) -> Option<&dyn ObservableSource> {
        Some(self)
    }
}

impl ObservableSource for MemorySource {
    fn reload(&self) -> Result<bool, SourceError> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }
        Ok(self.dirty.swap(false, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_source() {
        let mut p = Partial::new();
        p.set("a.b", 1);
        let source = PartialSource::new(p);

        assert!(source.has("a.b"));
        assert_eq!(source.get("a.b"), Some(Value::Int(1)));
        assert!(source.as_observable().is_none());
        assert!(source.close().is_ok());
    }

    #[test]
    fn test_memory_source_reload() {
        let source = MemorySource::new(Partial::new());
        let observable = source.as_observable().unwrap();
        assert!(!observable.reload().unwrap());

        source.set("node", "value");
        assert_eq!(source.get("node"), Some(Value::from("value")));
        assert!(observable.reload().unwrap());
        assert!(!observable.reload().unwrap());

        source.replace(Partial::new());
        assert!(!source.has("node"));
        assert!(observable.reload().unwrap());
    }

    #[test]
    fn test_memory_source_closed() {
        let source = MemorySource::default();
        source.close().unwrap();
        assert!(source.is_closed());
        assert!(matches!(source.reload(), Err(SourceError::Closed)));
    }
}
