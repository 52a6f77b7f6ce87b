//! Settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → RegistrySettings handed to Config::new
//!     → SourceSettings::build() registered in declared order
//! ```
//!
//! # Design Decisions
//! - Settings are passed explicitly, there is no process-wide state
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, SettingsError};
pub use schema::{ObservabilitySettings, RegistrySettings, Settings, SourceKind, SourceSettings};
pub use validation::ValidationError;
