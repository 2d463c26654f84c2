//! Remaining-Useful-Life Engine
//!
//! Estimates days to functional failure for one asset from its ML failure
//! prediction (when one exists) and the last 30 days of component degradation
//! measurements.
//!
//! ## Architecture
//!
//! - **degradation**: per-component OLS trend, time-to-failure, volatility, acceleration
//! - **reconcile**: ML prediction precedence, metadata-scaled confidence, statistical fallback
//! - **health**: component health scores, critical metric flags, asset health index
//! - **risk**: four-level classification with buffered (hysteresis) thresholds
//! - **recommendations**: ordered, de-duplicated maintenance actions
//! - **engine**: store reads, batch evaluation, degradation recording

mod degradation;
mod engine;
mod health;
mod reconcile;
mod recommendations;
mod risk;

pub use degradation::{DegradationAnalyzer, FAILURE_THRESHOLD};
pub use engine::RulEngine;
pub use health::{component_statuses, critical_metrics, health_index};
pub use reconcile::{reconcile, RulEstimate};
pub use recommendations::build_recommendations;
pub use risk::{RiskClassifier, RiskSignals};
