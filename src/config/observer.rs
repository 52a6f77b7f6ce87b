//! Path observers.
//!
//! # Responsibilities
//! - Remember the last merged value seen at a path
//! - Produce a notification when a rebuild changes that value
//! - Deliver notifications in rebuild order, outside the registry lock
//!
//! # Dispatch
//! ```text
//! rebuild (registry lock held) → enqueue notifications
//! lock released                → drain: one thread delivers, in order,
//!                                until the queue is empty
//! ```
//! A caller that finds a drain in progress (another thread, or a callback
//! re-entering the registry) leaves its notifications to that drain.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;
use crate::partial::{Partial, Value};

/// Callback receiving `(old, new)`; `None` means no value.
pub type ObserverCallback = Arc<dyn Fn(Option<&Value>, Option<&Value>) + Send + Sync>;

pub(crate) struct Observer {
    pub(crate) path: String,
    last: Option<Value>,
    callback: ObserverCallback,
}

/// A pending `(old, new)` callback invocation.
pub(crate) struct Notification {
    callback: ObserverCallback,
    old: Option<Value>,
    new: Option<Value>,
}

impl Observer {
    pub(crate) fn new(path: String, initial: Option<Value>, callback: ObserverCallback) -> Self {
        Self {
            path,
            last: initial,
            callback,
        }
    }

    /// Compare against the new tree, updating the snapshot on change.
    pub(crate) fn observe(&mut self, merged: &Partial) -> Option<Notification> {
        let current = merged.get(&self.path);
        if current == self.last {
            return None;
        }
        let old = std::mem::replace(&mut self.last, current.clone());
        Some(Notification {
            callback: self.callback.clone(),
            old,
            new: current,
        })
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("path", &self.path)
            .field("last", &self.last)
            .finish()
    }
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Notification>,
    draining: bool,
}

/// Ordered delivery of observer notifications.
#[derive(Default)]
pub(crate) struct Dispatcher {
    queue: Mutex<Queue>,
}

impl Dispatcher {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue notifications. Called with the registry lock held.
    pub(crate) fn enqueue(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }
        metrics::record_observer_notifications(notifications.len());
        self.lock().pending.extend(notifications);
    }

    /// Deliver queued notifications. Must run without the registry lock held.
    pub(crate) fn drain(&self) {
        {
            let mut queue = self.lock();
            if queue.draining || queue.pending.is_empty() {
                return;
            }
            queue.draining = true;
        }
        let _reset = DrainGuard(self);

        loop {
            let n = {
                let mut queue = self.lock();
                match queue.pending.pop_front() {
                    Some(n) => n,
                    None => {
                        // Cleared under the same lock that saw the queue empty.
                        queue.draining = false;
                        return;
                    }
                }
            };
            (n.callback)(n.old.as_ref(), n.new.as_ref());
        }
    }
}

/// Clears the draining flag when a callback panics mid-drain.
struct DrainGuard<'a>(&'a Dispatcher);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}
