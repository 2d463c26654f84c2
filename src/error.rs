//! Error types for the prognostics core
//!
//! Two domain outcomes matter to callers:
//! - an unknown asset, which the RUL engine reports as `Ok(None)` rather than an error
//! - too little data for a statistical operation, which is always an error
//!
//! Store failures are carried through unchanged so the store-access layer keeps
//! ownership of retries and circuit breaking.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors raised by the RUL engine and the trend analyzer
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Insufficient data for {context}: need {needed}, have {available}")]
    InsufficientData {
        context: String,
        needed: usize,
        available: usize,
    },

    #[error("Equipment not found: {0}")]
    NotFound(String),

    #[error("Invalid measurement for {field}: {reason}")]
    InvalidMeasurement { field: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalyticsError {
    /// Build an insufficient-data error for a named operation
    pub fn insufficient(context: impl Into<String>, needed: usize, available: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            needed,
            available,
        }
    }

    /// True when the error is a minimum-sample rejection
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
