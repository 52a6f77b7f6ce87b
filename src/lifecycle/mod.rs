//! Lifecycle management for the `hotconf` binary.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load settings → Validate → Config::new → Register sources → Observers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → leave the signal loop → Config::close
//!     SIGHUP → Config::reload
//! ```

pub mod signals;
