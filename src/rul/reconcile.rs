//! Reconciliation of the ML prediction with the degradation trend
//!
//! An ML-origin prediction, when present, decides remaining days and failure
//! probability. Its confidence is scaled by the model's metadata multiplier.
//! Without one the governing degradation pattern is used on its own.

use chrono::{DateTime, Utc};

use crate::config::RulConfig;
use crate::stats::clamp_confidence;
use crate::types::{DegradationPattern, FailurePrediction, ModelMetadata, PredictionMethod};

use super::degradation::DegradationAnalyzer;

/// Reconciled headline numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulEstimate {
    pub remaining_days: f64,
    pub confidence: f64,
    pub failure_probability: f64,
    pub method: PredictionMethod,
}

/// Remaining days from the degradation trend alone
fn pattern_days(governing: Option<&DegradationPattern>, config: &RulConfig) -> f64 {
    governing
        .and_then(|p| p.time_to_failure_days)
        .unwrap_or(config.default_horizon_days)
        .max(0.0)
}

pub fn reconcile(
    prediction: Option<&FailurePrediction>,
    metadata: Option<&ModelMetadata>,
    governing: Option<&DegradationPattern>,
    now: DateTime<Utc>,
    config: &RulConfig,
) -> RulEstimate {
    match prediction {
        Some(ml) => {
            let remaining_days = ml.predicted_failure_date.map_or_else(
                || pattern_days(governing, config),
                |date| ((date - now).num_seconds() as f64 / 86_400.0).max(0.0),
            );

            let confidence = match metadata.and_then(ModelMetadata::effective_multiplier) {
                Some(multiplier) => (ml.confidence * multiplier).min(0.95),
                None => ml.confidence,
            };

            RulEstimate {
                remaining_days,
                confidence: clamp_confidence(confidence),
                failure_probability: ml.failure_probability.clamp(0.0, 1.0),
                method: PredictionMethod::from_model_type(&ml.model_type),
            }
        }
        None => RulEstimate {
            remaining_days: pattern_days(governing, config),
            confidence: clamp_confidence(
                governing.map_or(config.fallback_confidence, |p| p.confidence),
            ),
            failure_probability: DegradationAnalyzer::failure_probability(governing, config),
            method: PredictionMethod::Statistical,
        },
    }
}
