//! Trigger state machine.
//!
//! # States
//! - Running: a timed wait is pending
//! - Stopped: cancelled, or a recurring callback failed (terminal)
//! - Fired: a one-shot trigger ran its callback (terminal)
//!
//! # State Transitions
//! ```text
//! Running → Stopped: stop() / close() / drop, or recurring callback error
//! Running → Fired:   one-shot timer expiry
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Running = 0,
    Stopped = 1,
    Fired = 2,
}

impl From<u8> for TriggerState {
    fn from(val: u8) -> Self {
        match val {
            0 => TriggerState::Running,
            2 => TriggerState::Fired,
            _ => TriggerState::Stopped,
        }
    }
}

/// Atomic cell holding a [`TriggerState`].
#[derive(Debug)]
pub(crate) struct AtomicTriggerState(AtomicU8);

impl AtomicTriggerState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(TriggerState::Running as u8))
    }

    pub(crate) fn load(&self) -> TriggerState {
        TriggerState::from(self.0.load(Ordering::SeqCst))
    }

    /// Leave `Running` for `next`. Returns false if already terminal.
    pub(crate) fn finish(&self, next: TriggerState) -> bool {
        self.0
            .compare_exchange(
                TriggerState::Running as u8,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_terminal_transition() {
        let state = AtomicTriggerState::new();
        assert_eq!(state.load(), TriggerState::Running);

        assert!(state.finish(TriggerState::Fired));
        assert!(!state.finish(TriggerState::Stopped));
        assert_eq!(state.load(), TriggerState::Fired);
    }
}
