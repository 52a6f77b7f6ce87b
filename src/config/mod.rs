//! Configuration registry.
//!
//! # Data Flow
//! ```text
//! add_source / remove_source / set_source_priority
//!     → write lock on {sources, observers}
//!     → rebuild: fold sources by ascending priority into a fresh tree
//!     → atomic swap of Arc<Partial>
//!     → queue (old, new) for observers whose value changed
//!     → release lock, drain the queue in rebuild order
//!
//! Recurring trigger (optional):
//!     reload() → ask every ObservableSource
//!     → any changed? rebuild once
//!
//! Readers:
//!     has / get / typed getters → load current Arc<Partial>, no lock
//! ```
//!
//! # Design Decisions
//! - Merged tree is immutable once published; rebuilds replace it
//! - Callbacks run outside the lock and may call back into the registry
//! - Callbacks see changes in rebuild order, one at a time; a callback's
//!   own registry changes are delivered after it returns
//! - Reload errors are logged and counted, never propagated
//! - Failed mutations leave sources and merged tree untouched

pub mod observer;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ConfigResult};
use crate::observability::metrics;
use crate::partial::{Partial, Value};
use crate::settings::RegistrySettings;
use crate::source::Source;
use crate::trigger::Trigger;

use observer::{Dispatcher, Observer};
pub use observer::ObserverCallback;

struct SourceEntry {
    id: String,
    priority: i32,
    source: Arc<dyn Source>,
}

#[derive(Default)]
struct State {
    /// Sorted ascending by priority, registration order among equals.
    sources: Vec<SourceEntry>,
    observers: Vec<Observer>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    partial: ArcSwap<Partial>,
    dispatcher: Dispatcher,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recompute the merged tree and queue observer notifications.
    /// The caller holds the lock and drains after releasing it.
    fn rebuild(&self, state: &mut State) {
        let started = Instant::now();

        let mut merged = Partial::new();
        for entry in &state.sources {
            merged.merge_from(&entry.source.partial());
        }
        let merged = Arc::new(merged);
        self.partial.store(merged.clone());

        let notifications: Vec<_> = state
            .observers
            .iter_mut()
            .filter_map(|observer| observer.observe(&merged))
            .collect();

        metrics::record_rebuild(started.elapsed());
        tracing::debug!(
            sources = state.sources.len(),
            notifications = notifications.len(),
            "Configuration rebuilt"
        );
        self.dispatcher.enqueue(notifications);
    }

    fn reload(&self) -> bool {
        let mut state = self.lock();

        let mut changed = false;
        for entry in &state.sources {
            let Some(observable) = entry.source.as_observable() else {
                continue;
            };
            match observable.reload() {
                Ok(true) => {
                    tracing::debug!(source = %entry.id, "Source content changed");
                    changed = true;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(source = %entry.id, error = %e, "Source reload failed");
                    metrics::record_reload_error(&entry.id);
                }
            }
        }

        if !changed {
            return false;
        }
        self.rebuild(&mut state);
        drop(state);
        self.dispatcher.drain();
        true
    }
}

/// Layered configuration registry.
pub struct Config {
    shared: Arc<Shared>,
    trigger: Mutex<Option<Trigger>>,
}

impl Config {
    /// Create a registry.
    ///
    /// With an observe interval set, a recurring trigger calls
    /// [`Config::reload`] on the current Tokio runtime.
    pub fn new(settings: RegistrySettings) -> ConfigResult<Self> {
        let shared = Arc::new(Shared::default());

        let trigger = match settings.observe_interval() {
            Some(interval) => {
                let weak = Arc::downgrade(&shared);
                let trigger = Trigger::recurring(interval, move || {
                    let shared = weak.upgrade().ok_or("configuration registry dropped")?;
                    shared.reload();
                    Ok(())
                })?;
                tracing::info!(
                    interval_ms = interval.as_millis() as u64,
                    "Periodic source reload enabled"
                );
                Some(trigger)
            }
            None => None,
        };

        Ok(Self {
            shared,
            trigger: Mutex::new(trigger),
        })
    }

    /// Register a source and rebuild.
    pub fn add_source(
        &self,
        id: impl Into<String>,
        priority: i32,
        source: Arc<dyn Source>,
    ) -> ConfigResult<()> {
        let id = id.into();
        let mut state = self.shared.lock();
        if state.sources.iter().any(|e| e.id == id) {
            return Err(ConfigError::DuplicateSource(id));
        }

        tracing::info!(source = %id, priority, "Source registered");
        state.sources.push(SourceEntry {
            id,
            priority,
            source,
        });
        state.sources.sort_by_key(|e| e.priority);
        metrics::record_sources(state.sources.len());

        self.shared.rebuild(&mut state);
        drop(state);
        self.shared.dispatcher.drain();
        Ok(())
    }

    /// Unregister and close a source. Unknown ids are ignored.
    ///
    /// The source is removed and the tree rebuilt even if closing fails.
    pub fn remove_source(&self, id: &str) -> ConfigResult<()> {
        let mut state = self.shared.lock();
        let Some(position) = state.sources.iter().position(|e| e.id == id) else {
            return Ok(());
        };

        let entry = state.sources.remove(position);
        metrics::record_sources(state.sources.len());
        tracing::info!(source = %id, "Source removed");

        self.shared.rebuild(&mut state);
        drop(state);
        self.shared.dispatcher.drain();

        entry.source.close().map_err(|source| ConfigError::Source {
            id: entry.id,
            source,
        })
    }

    /// Change the priority of a registered source and rebuild.
    pub fn set_source_priority(&self, id: &str, priority: i32) -> ConfigResult<()> {
        let mut state = self.shared.lock();
        let entry = state
            .sources
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ConfigError::UnknownSource(id.to_string()))?;

        entry.priority = priority;
        state.sources.sort_by_key(|e| e.priority);
        tracing::info!(source = %id, priority, "Source priority changed");

        self.shared.rebuild(&mut state);
        drop(state);
        self.shared.dispatcher.drain();
        Ok(())
    }

    /// Registered source by id.
    pub fn source(&self, id: &str) -> ConfigResult<Arc<dyn Source>> {
        self.shared
            .lock()
            .sources
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.source.clone())
            .ok_or_else(|| ConfigError::UnknownSource(id.to_string()))
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.shared.lock().sources.iter().any(|e| e.id == id)
    }

    /// Source ids, lowest priority first.
    pub fn source_ids(&self) -> Vec<String> {
        self.shared
            .lock()
            .sources
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Current merged tree.
    pub fn snapshot(&self) -> Arc<Partial> {
        self.shared.partial.load_full()
    }

    pub fn has(&self, path: &str) -> bool {
        self.shared.partial.load().has(path)
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.shared.partial.load().get(path)
    }

    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.shared.partial.load().get_or(path, default)
    }

    pub fn bool(&self, path: &str) -> ConfigResult<bool> {
        Ok(self.shared.partial.load().bool(path)?)
    }

    pub fn bool_or(&self, path: &str, default: bool) -> ConfigResult<bool> {
        Ok(self.shared.partial.load().bool_or(path, default)?)
    }

    pub fn int(&self, path: &str) -> ConfigResult<i64> {
        Ok(self.shared.partial.load().int(path)?)
    }

    pub fn int_or(&self, path: &str, default: i64) -> ConfigResult<i64> {
        Ok(self.shared.partial.load().int_or(path, default)?)
    }

    pub fn float(&self, path: &str) -> ConfigResult<f64> {
        Ok(self.shared.partial.load().float(path)?)
    }

    pub fn float_or(&self, path: &str, default: f64) -> ConfigResult<f64> {
        Ok(self.shared.partial.load().float_or(path, default)?)
    }

    pub fn string(&self, path: &str) -> ConfigResult<String> {
        Ok(self.shared.partial.load().string(path)?)
    }

    pub fn string_or(&self, path: &str, default: impl Into<String>) -> ConfigResult<String> {
        Ok(self.shared.partial.load().string_or(path, default)?)
    }

    pub fn list(&self, path: &str) -> ConfigResult<Vec<Value>> {
        Ok(self.shared.partial.load().list(path)?)
    }

    pub fn list_or(&self, path: &str, default: Vec<Value>) -> ConfigResult<Vec<Value>> {
        Ok(self.shared.partial.load().list_or(path, default)?)
    }

    pub fn partial(&self, path: &str) -> ConfigResult<Partial> {
        Ok(self.shared.partial.load().partial(path)?)
    }

    pub fn partial_or(&self, path: &str, default: Partial) -> ConfigResult<Partial> {
        Ok(self.shared.partial.load().partial_or(path, default)?)
    }

    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        Ok(self.shared.partial.load().populate(path)?)
    }

    pub fn populate_or<T: DeserializeOwned>(&self, path: &str, default: T) -> ConfigResult<T> {
        Ok(self.shared.partial.load().populate_or(path, default)?)
    }

    /// Watch a path. The current value is recorded, nothing is invoked yet.
    pub fn add_observer<F>(&self, path: impl Into<String>, callback: F)
    where
        F: Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static,
    {
        let path = path.into();
        let mut state = self.shared.lock();
        let initial = self.shared.partial.load().get(&path);
        tracing::debug!(path = %path, "Observer registered");
        state
            .observers
            .push(Observer::new(path, initial, Arc::new(callback)));
    }

    /// Remove the first observer on `path`. Returns whether one was found.
    pub fn remove_observer(&self, path: &str) -> bool {
        let mut state = self.shared.lock();
        match state.observers.iter().position(|o| o.path == path) {
            Some(position) => {
                state.observers.remove(position);
                true
            }
            None => false,
        }
    }

    /// Ask observable sources for changes, rebuilding once if any changed.
    ///
    /// Returns whether a rebuild happened.
    pub fn reload(&self) -> bool {
        self.shared.reload()
    }

    /// Stop periodic reloading and close every source.
    ///
    /// The last merged tree stays readable. Calling twice is harmless.
    pub fn close(&self) {
        let trigger = self
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(trigger) = trigger {
            trigger.stop();
        }

        let sources = std::mem::take(&mut self.shared.lock().sources);
        metrics::record_sources(0);
        for entry in sources {
            if let Err(e) = entry.source.close() {
                tracing::warn!(source = %entry.id, error = %e, "Failed to close source");
            }
        }
        tracing::info!("Configuration registry closed");
    }
}

impl Default for Config {
    /// A registry without periodic reloading.
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            trigger: Mutex::new(None),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        let sources: Vec<(&str, i32)> = state
            .sources
            .iter()
            .map(|e| (e.id.as_str(), e.priority))
            .collect();
        f.debug_struct("Config")
            .field("sources", &sources)
            .field("observers", &state.observers)
            .finish()
    }
}
