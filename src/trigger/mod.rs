//! Background one-shot and recurring callbacks.
//!
//! # Data Flow
//! ```text
//! Trigger::once / Trigger::recurring
//!     → spawn task on the current Tokio runtime
//!     → select! { timer expiry, stop signal }
//!     → expiry while Running: run callback
//!         once:      → Fired, task ends
//!         recurring: → Ok: wait another period
//!                    → Err: → Stopped, task ends
//! ```
//!
//! # Design Decisions
//! - Stop is a CAS on the state plus a watch signal: idempotent, never blocks
//! - Stop does not interrupt a callback already executing
//! - Dropping a trigger stops it
//! - A recurring error acts as a circuit breaker, there is no retry

pub mod state;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::error::{CallbackError, TriggerError};
use crate::observability::metrics;

pub use state::TriggerState;
use state::AtomicTriggerState;

/// Smallest period a recurring trigger runs with.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Once,
    Recurring,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Once => "once",
            TriggerKind::Recurring => "recurring",
        }
    }
}

/// Handle on a scheduled callback.
pub struct Trigger {
    timer: Duration,
    kind: TriggerKind,
    state: Arc<AtomicTriggerState>,
    stop_tx: watch::Sender<bool>,
}

impl Trigger {
    /// Run `callback` once after `delay`.
    pub fn once<F>(delay: Duration, callback: F) -> Result<Self, TriggerError>
    where
        F: FnOnce() -> Result<(), CallbackError> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TriggerError::NoRuntime)?;
        let trigger = Self::new(delay, TriggerKind::Once);
        let state = trigger.state.clone();
        let mut stop_rx = trigger.stop_tx.subscribe();

        runtime.spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = stop_rx.changed() => return,
            }

            if !state.finish(TriggerState::Fired) {
                return;
            }
            metrics::record_trigger_fire(TriggerKind::Once.as_str());
            if let Err(e) = callback() {
                tracing::warn!(error = %e, "One-shot trigger callback failed");
            }
        });

        Ok(trigger)
    }

    /// Run `callback` every `period` until stopped or until it fails.
    pub fn recurring<F>(period: Duration, mut callback: F) -> Result<Self, TriggerError>
    where
        F: FnMut() -> Result<(), CallbackError> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TriggerError::NoRuntime)?;
        let period = period.max(MIN_PERIOD);
        let trigger = Self::new(period, TriggerKind::Recurring);
        let state = trigger.state.clone();
        let mut stop_rx = trigger.stop_tx.subscribe();

        runtime.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop_rx.changed() => break,
                }

                if state.load() != TriggerState::Running {
                    break;
                }
                metrics::record_trigger_fire(TriggerKind::Recurring.as_str());
                if let Err(e) = callback() {
                    tracing::warn!(
                        period_ms = period.as_millis() as u64,
                        error = %e,
                        "Recurring trigger callback failed, stopping"
                    );
                    state.finish(TriggerState::Stopped);
                    break;
                }
            }
        });

        Ok(trigger)
    }

    fn new(timer: Duration, kind: TriggerKind) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            timer,
            kind,
            state: Arc::new(AtomicTriggerState::new()),
            stop_tx,
        }
    }

    /// Prevent any further firing. Safe to call any number of times.
    pub fn stop(&self) {
        if self.state.finish(TriggerState::Stopped) {
            let _ = self.stop_tx.send(true);
            tracing::debug!(kind = self.kind.as_str(), "Trigger stopped");
        }
    }

    /// Same as [`Trigger::stop`].
    pub fn close(&self) {
        self.stop();
    }

    /// Configured delay (one-shot) or period (recurring).
    pub fn timer(&self) -> Duration {
        self.timer
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    pub fn state(&self) -> TriggerState {
        self.state.load()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == TriggerState::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.state() == TriggerState::Running
    }
}

impl Drop for Trigger {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("timer", &self.timer)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recurring_fires_repeatedly() {
        let (count, cc) = counter();
        let trigger = Trigger::recurring(Duration::from_millis(20), move || {
            cc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        time::sleep(Duration::from_millis(100)).await;
        assert!(count.load(Ordering::SeqCst) > 2);
        assert!(trigger.is_running());
        assert_eq!(trigger.timer(), Duration::from_millis(20));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_before_first_period() {
        let (count, cc) = counter();
        let trigger = Trigger::recurring(Duration::from_millis(20), move || {
            cc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        trigger.stop();
        time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(trigger.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let trigger = Trigger::recurring(Duration::from_millis(20), || Ok(())).unwrap();
        trigger.stop();
        trigger.close();
        trigger.stop();
        assert_eq!(trigger.state(), TriggerState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_once_fires_exactly_once() {
        let (count, cc) = counter();
        let trigger = Trigger::once(Duration::from_millis(10), move || {
            cc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(trigger.state(), TriggerState::Fired);
        assert_eq!(trigger.kind(), TriggerKind::Once);

        trigger.stop();
        assert_eq!(trigger.state(), TriggerState::Fired);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_once_stopped_never_fires() {
        let (count, cc) = counter();
        let trigger = Trigger::once(Duration::from_millis(20), move || {
            cc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        trigger.stop();
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recurring_error_stops() {
        let (count, cc) = counter();
        let trigger = Trigger::recurring(Duration::from_millis(10), move || {
            let n = cc.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= 2 {
                return Err("source keeps failing".into());
            }
            Ok(())
        })
        .unwrap();

        time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(trigger.is_stopped());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_stops() {
        let (count, cc) = counter();
        let trigger = Trigger::recurring(Duration::from_millis(10), move || {
            cc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        drop(trigger);

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_requires_runtime() {
        let result = Trigger::once(Duration::from_millis(1), || Ok(()));
        assert!(matches!(result, Err(TriggerError::NoRuntime)));
    }
}
