//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hotconf::source::{MemorySource, PartialSource};
use hotconf::{ObservableSource, Partial, Source, SourceError, Value};

/// Build a tree from a JSON literal.
pub fn tree(json: serde_json::Value) -> Partial {
    Partial::try_from(json).unwrap()
}

/// A source with fixed content.
#[allow(dead_code)]
pub fn static_source(json: serde_json::Value) -> Arc<dyn Source> {
    Arc::new(PartialSource::new(tree(json)))
}

/// Records every `(old, new)` pair an observer receives.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(Option<Value>, Option<Value>)>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn callback(&self) -> impl Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |old: Option<&Value>, new: Option<&Value>| {
            calls.lock().unwrap().push((old.cloned(), new.cloned()));
        }
    }

    pub fn calls(&self) -> Vec<(Option<Value>, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// An observable source whose reload can be made to fail.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FlakySource {
    pub inner: MemorySource,
    failing: AtomicBool,
    reloads: AtomicUsize,
}

#[allow(dead_code)]
impl FlakySource {
    pub fn failing() -> Self {
        let source = Self::default();
        source.set_failing(true);
        source
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Source for FlakySource {
    fn partial(&self) -> Arc<Partial> {
        self.inner.partial()
    }

    fn as_observable(&self) -> Option<&dyn ObservableSource> {
        Some(self)
    }
}

impl ObservableSource for FlakySource {
    fn reload(&self) -> Result<bool, SourceError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Reload("injected failure".into()));
        }
        self.inner.reload()
    }
}
