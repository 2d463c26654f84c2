//! Degradation Trend Fitting
//!
//! Fits an OLS line of `degradation_metric` against sample index for every
//! component with enough ordered measurements, and converts the per-sample
//! slope into points/day using the mean sampling interval.
//!
//! ## Outputs per component
//! - `degradation_per_day` and `time_to_failure_days = (100 - latest) / rate`
//! - `volatility`: RMS residual of the fit
//! - `acceleration`: second difference of the last three measurements
//! - `confidence = min(0.95, R² × min(n, cap) / cap)`

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::config::RulConfig;
use crate::stats::{clamp_confidence, LinearFit};
use crate::types::{DegradationPattern, DegradationRecord};

/// Degradation metric value at which a component is considered failed
pub const FAILURE_THRESHOLD: f64 = 100.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Stateless degradation analysis
pub struct DegradationAnalyzer;

impl DegradationAnalyzer {
    /// Group records by component (timestamp order, ties keep arrival order)
    pub fn group_by_component(
        records: &[DegradationRecord],
    ) -> BTreeMap<String, Vec<&DegradationRecord>> {
        let mut groups: BTreeMap<String, Vec<&DegradationRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.component_type.clone())
                .or_default()
                .push(record);
        }
        for list in groups.values_mut() {
            list.sort_by_key(|r| r.timestamp);
        }
        groups
    }

    /// Fit every component that has at least `min_pattern_samples` measurements
    pub fn fit_all(records: &[DegradationRecord], config: &RulConfig) -> Vec<DegradationPattern> {
        Self::group_by_component(records)
            .into_iter()
            .filter_map(|(component, list)| Self::fit_component(&component, &list, config))
            .collect()
    }

    /// Fit one component's ordered history
    pub fn fit_component(
        component_type: &str,
        ordered: &[&DegradationRecord],
        config: &RulConfig,
    ) -> Option<DegradationPattern> {
        let n = ordered.len();
        if n < config.min_pattern_samples.max(3) {
            return None;
        }

        let values: Vec<f64> = ordered.iter().map(|r| r.degradation_metric).collect();
        let fit = LinearFit::over_index(&values);

        let first = ordered.first()?.timestamp;
        let last = ordered.last()?.timestamp;
        let interval_days = Self::mean_interval_days(first, last, n);

        let degradation_per_day = match interval_days {
            Some(days) => fit.slope / days,
            None => 0.0,
        };

        let latest_value = values[n - 1];
        let time_to_failure_days = if degradation_per_day > 0.0 {
            Some(((FAILURE_THRESHOLD - latest_value) / degradation_per_day).max(0.0))
        } else {
            None
        };

        let acceleration = values[n - 1] - 2.0 * values[n - 2] + values[n - 3];

        let cap = config.confidence_sample_cap.max(1);
        let sample_credit = n.min(cap) as f64 / cap as f64;
        let confidence = clamp_confidence(fit.r_squared * sample_credit);

        Some(DegradationPattern {
            component_type: component_type.to_string(),
            sample_count: n,
            slope_per_sample: fit.slope,
            degradation_per_day,
            latest_value,
            time_to_failure_days,
            r_squared: fit.r_squared,
            volatility: fit.rms_residual(),
            acceleration,
            confidence,
        })
    }

    /// The component closest to failure: smallest non-negative finite time-to-failure
    pub fn governing(patterns: &[DegradationPattern]) -> Option<&DegradationPattern> {
        patterns
            .iter()
            .filter_map(|p| p.time_to_failure_days.map(|ttf| (ttf, p)))
            .filter(|(ttf, _)| ttf.is_finite() && *ttf >= 0.0)
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, p)| p)
    }

    /// Failure probability when no ML prediction exists.
    ///
    /// `time_weight × timeFactor + rate_weight × rateFactor + accel_weight × accelFactor`,
    /// each factor normalized against a fixed reference scale and clamped to [0, 1];
    /// the blend is clamped to `[min_failure_probability, max_failure_probability]`.
    pub fn failure_probability(pattern: Option<&DegradationPattern>, config: &RulConfig) -> f64 {
        let (time_factor, rate_factor, accel_factor) = match pattern {
            Some(p) => {
                let time_factor = p
                    .time_to_failure_days
                    .map(|ttf| (1.0 - ttf / config.reference_days).clamp(0.0, 1.0))
                    .unwrap_or(0.0);
                let rate_factor =
                    (p.degradation_per_day / config.reference_rate_per_day).clamp(0.0, 1.0);
                let accel_factor =
                    (p.acceleration / config.reference_acceleration).clamp(0.0, 1.0);
                (time_factor, rate_factor, accel_factor)
            }
            None => (0.0, 0.0, 0.0),
        };

        let blended = config.time_weight * time_factor
            + config.rate_weight * rate_factor
            + config.acceleration_weight * accel_factor;
        blended.clamp(config.min_failure_probability, config.max_failure_probability)
    }

    /// Rate (points/day) of a new measurement relative to the previous record.
    ///
    /// 0 when there is no previous record or the elapsed time is not positive.
    pub fn rate_since(
        previous: Option<&DegradationRecord>,
        metric: f64,
        at: DateTime<Utc>,
    ) -> f64 {
        let Some(prev) = previous else {
            return 0.0;
        };
        let elapsed_days = (at - prev.timestamp).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
        if elapsed_days <= 0.0 {
            return 0.0;
        }
        (metric - prev.degradation_metric) / elapsed_days
    }

    fn mean_interval_days(first: DateTime<Utc>, last: DateTime<Utc>, n: usize) -> Option<f64> {
        if n < 2 {
            return None;
        }
        let span_days = (last - first).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
        let interval = span_days / (n - 1) as f64;
        (interval > 0.0).then_some(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn record(component: &str, day: i64, metric: f64) -> DegradationRecord {
        DegradationRecord {
            equipment_id: "eng-1".to_string(),
            component_type: component.to_string(),
            timestamp: t0() + Duration::days(day),
            degradation_metric: metric,
            vibration_level: None,
            temperature: None,
            oil_condition: None,
            wear_particle_count: None,
            degradation_rate: 0.0,
        }
    }

    #[test]
    fn test_linear_degradation_time_to_failure() {
        // 2 points/day, daily samples, latest 28 -> 36 days left
        let records: Vec<_> = (0..10).map(|d| record("bearing", d, 10.0 + 2.0 * d as f64)).collect();
        let patterns = DegradationAnalyzer::fit_all(&records, &RulConfig::default());
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert!((p.degradation_per_day - 2.0).abs() < 1e-9);
        assert!((p.time_to_failure_days.unwrap() - 36.0).abs() < 1e-6);
        assert!(p.volatility < 1e-9);
        assert!(p.acceleration.abs() < 1e-9);
        // R² = 1, 10 of 30 samples -> 1/3
        assert!((p.confidence - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_sampling_scales_rate() {
        // One sample every 2 days, +4 per sample -> 2 points/day
        let records: Vec<_> = (0..5).map(|i| record("seal", i * 2, 20.0 + 4.0 * i as f64)).collect();
        let patterns = DegradationAnalyzer::fit_all(&records, &RulConfig::default());
        assert!((patterns[0].degradation_per_day - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_improving_component_has_no_failure_horizon() {
        let records: Vec<_> = (0..6).map(|d| record("filter", d, 60.0 - d as f64)).collect();
        let patterns = DegradationAnalyzer::fit_all(&records, &RulConfig::default());
        assert!(patterns[0].time_to_failure_days.is_none());
        assert!(DegradationAnalyzer::governing(&patterns).is_none());
    }

    #[test]
    fn test_too_few_samples_skipped() {
        let records = vec![record("rotor", 0, 10.0), record("rotor", 1, 20.0)];
        assert!(DegradationAnalyzer::fit_all(&records, &RulConfig::default()).is_empty());
    }

    #[test]
    fn test_identical_timestamps_have_no_rate() {
        let records: Vec<_> = (0..4).map(|i| record("rotor", 0, 10.0 + i as f64)).collect();
        let patterns = DegradationAnalyzer::fit_all(&records, &RulConfig::default());
        assert!(patterns[0].degradation_per_day.abs() < f64::EPSILON);
        assert!(patterns[0].time_to_failure_days.is_none());
    }

    #[test]
    fn test_governing_picks_nearest_failure() {
        let mut records: Vec<_> = (0..8).map(|d| record("bearing", d, 10.0 + d as f64)).collect();
        records.extend((0..8).map(|d| record("impeller", d, 50.0 + 5.0 * d as f64)));
        let patterns = DegradationAnalyzer::fit_all(&records, &RulConfig::default());
        let governing = DegradationAnalyzer::governing(&patterns).unwrap();
        assert_eq!(governing.component_type, "impeller");
    }

    #[test]
    fn test_failure_probability_bounds() {
        let config = RulConfig::default();
        assert!((DegradationAnalyzer::failure_probability(None, &config) - 0.05).abs() < 1e-12);

        let saturated = DegradationPattern {
            component_type: "x".to_string(),
            sample_count: 10,
            slope_per_sample: 20.0,
            degradation_per_day: 20.0,
            latest_value: 99.0,
            time_to_failure_days: Some(0.0),
            r_squared: 1.0,
            volatility: 0.0,
            acceleration: 50.0,
            confidence: 0.3,
        };
        let p = DegradationAnalyzer::failure_probability(Some(&saturated), &config);
        assert!((p - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_rate_since_previous() {
        let prev = record("bearing", 0, 40.0);
        let rate = DegradationAnalyzer::rate_since(Some(&prev), 46.0, t0() + Duration::days(3));
        assert!((rate - 2.0).abs() < 1e-9);
        assert!(DegradationAnalyzer::rate_since(None, 46.0, t0()).abs() < f64::EPSILON);
        assert!(DegradationAnalyzer::rate_since(Some(&prev), 46.0, t0()).abs() < f64::EPSILON);
    }
}
