//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check source ids are present and unique
//! - Check each source carries the fields its kind needs
//! - Validate value ranges (interval > 0, parseable addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::settings::schema::Settings;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("registry.observe_interval_ms must be greater than zero")]
    ZeroObserveInterval,

    #[error("source id must not be empty")]
    EmptySourceId,

    #[error("duplicate source id '{0}'")]
    DuplicateSourceId(String),

    #[error("source '{id}' is missing field '{field}'")]
    MissingField { id: String, field: &'static str },

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.registry.observe_interval_ms == Some(0) {
        errors.push(ValidationError::ZeroObserveInterval);
    }

    let mut seen = HashSet::new();
    for source in &settings.sources {
        if source.id.is_empty() {
            errors.push(ValidationError::EmptySourceId);
        } else if !seen.insert(source.id.as_str()) {
            errors.push(ValidationError::DuplicateSourceId(source.id.clone()));
        }
        if let Err(e) = source.check() {
            errors.push(e);
        }
    }

    let level = settings.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            settings.observability.log_level.clone(),
        ));
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            settings.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
