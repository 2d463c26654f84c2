//! Risk Classification with Hysteresis
//!
//! Four ordered levels, each entered by an OR of three signals (failure
//! probability, remaining days, health index). Every threshold carries a buffer
//! that only ever widens the higher-risk band, so a value hovering near a
//! boundary stays at the more severe level.
//!
//! ## Stateless vs. fed-back classification
//! - `previous = None`: buffered thresholds everywhere, evaluated
//!   critical → high → medium → low.
//! - `previous = Some(level)`: Schmitt-trigger rule. Escalating above the
//!   previous level requires crossing the nominal threshold of the target
//!   level; holding the previous level (or anything below it) uses the
//!   buffered thresholds. The core keeps no memory itself; callers persist the
//!   last level and pass it back in.

use serde::{Deserialize, Serialize};

use crate::config::{RiskBand, RiskBandsConfig};
use crate::types::RiskLevel;

/// Inputs to the risk classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub failure_probability: f64,
    pub remaining_days: f64,
    pub health_index: f64,
}

impl RiskBand {
    /// Band entered on the nominal thresholds
    pub fn entered_nominal(&self, s: &RiskSignals) -> bool {
        s.failure_probability > self.probability
            || s.remaining_days < self.remaining_days
            || s.health_index < self.health_index
    }

    /// Band entered on the buffered (widened) thresholds
    pub fn entered_buffered(&self, s: &RiskSignals) -> bool {
        s.failure_probability > self.probability - self.probability_buffer
            || s.remaining_days < self.remaining_days + self.days_buffer
            || s.health_index < self.health_index + self.health_buffer
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    bands: RiskBandsConfig,
}

impl RiskClassifier {
    pub const fn new(bands: RiskBandsConfig) -> Self {
        Self { bands }
    }

    pub fn classify(&self, signals: &RiskSignals, previous: Option<RiskLevel>) -> RiskLevel {
        let ladder = [
            (RiskLevel::Critical, &self.bands.critical),
            (RiskLevel::High, &self.bands.high),
            (RiskLevel::Medium, &self.bands.medium),
        ];

        for (level, band) in ladder {
            let entered = match previous {
                Some(prev) if level > prev => band.entered_nominal(signals),
                _ => band.entered_buffered(signals),
            };
            if entered {
                return level;
            }
        }
        RiskLevel::Low
    }
}
