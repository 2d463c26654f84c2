//! Component health and the asset health index

use crate::config::{CriticalMetricLimits, RulConfig};
use crate::stats::{clamp_confidence, clamp_percent, mean};
use crate::types::{ComponentHealthStatus, CriticalMetric, DegradationPattern, DegradationRecord};

use super::degradation::DegradationAnalyzer;

/// Condition-monitoring channels on a record that exceed their limits
pub fn critical_metrics(record: &DegradationRecord, limits: &CriticalMetricLimits) -> Vec<CriticalMetric> {
    let mut flagged = Vec::new();
    if record.vibration_level.is_some_and(|v| v > limits.vibration_max) {
        flagged.push(CriticalMetric::Vibration);
    }
    if record.temperature.is_some_and(|t| t > limits.temperature_max) {
        flagged.push(CriticalMetric::Temperature);
    }
    if record.oil_condition.is_some_and(|o| o < limits.oil_condition_min) {
        flagged.push(CriticalMetric::OilCondition);
    }
    if record.wear_particle_count.is_some_and(|w| w > limits.wear_particles_max) {
        flagged.push(CriticalMetric::WearParticles);
    }
    flagged
}

/// One status per component present in the history window, built from its latest record
pub fn component_statuses(
    records: &[DegradationRecord],
    patterns: &[DegradationPattern],
    config: &RulConfig,
) -> Vec<ComponentHealthStatus> {
    DegradationAnalyzer::group_by_component(records)
        .into_iter()
        .filter_map(|(component, list)| {
            let latest = *list.last()?;
            let pattern = patterns.iter().find(|p| p.component_type == component);
            let health_score = (100.0 - latest.degradation_metric).max(0.0);

            let predicted_failure_days = pattern
                .and_then(|p| p.time_to_failure_days)
                .filter(|d| d.is_finite())
                .unwrap_or(health_score * config.component_days_per_health_point);

            let confidence = pattern.map_or(config.fallback_confidence, |p| p.confidence);

            Some(ComponentHealthStatus {
                component_type: component,
                health_score: clamp_percent(health_score),
                degradation_metric: latest.degradation_metric,
                degradation_rate: latest.degradation_rate,
                predicted_failure_days,
                confidence: clamp_confidence(confidence),
                critical_metrics: critical_metrics(latest, &config.critical_limits),
            })
        })
        .collect()
}

/// Asset health index in [0, 100].
///
/// Time-based health (`remaining_days / horizon × 100`, capped at 100) is blended
/// with the mean component health, then discounted when the governing
/// degradation rate is rapid.
pub fn health_index(
    remaining_days: f64,
    components: &[ComponentHealthStatus],
    governing_rate: f64,
    config: &RulConfig,
) -> f64 {
    let time_health = (remaining_days / config.health_index_horizon_days * 100.0).min(100.0);

    let blended = if components.is_empty() {
        time_health
    } else {
        let scores: Vec<f64> = components.iter().map(|c| c.health_score).collect();
        config.health_time_weight * time_health + (1.0 - config.health_time_weight) * mean(&scores)
    };

    let discounted = if governing_rate > config.rapid_degradation_rate {
        blended * config.rapid_degradation_discount
    } else {
        blended
    };

    clamp_percent(discounted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(component: &str, day: i64, metric: f64) -> DegradationRecord {
        DegradationRecord {
            equipment_id: "pump-7".to_string(),
            component_type: component.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::days(day),
            degradation_metric: metric,
            vibration_level: None,
            temperature: None,
            oil_condition: None,
            wear_particle_count: None,
            degradation_rate: 1.5,
        }
    }

    #[test]
    fn test_critical_metric_limits() {
        let mut r = record("bearing", 0, 40.0);
        r.vibration_level = Some(12.0);
        r.temperature = Some(80.0);
        r.oil_condition = Some(35.0);
        r.wear_particle_count = Some(1500.0);
        let flagged = critical_metrics(&r, &CriticalMetricLimits::default());
        // 80 is not above the 80 limit
        assert_eq!(
            flagged,
            vec![
                CriticalMetric::Vibration,
                CriticalMetric::OilCondition,
                CriticalMetric::WearParticles
            ]
        );
    }

    #[test]
    fn test_fallback_failure_days_from_health() {
        let records = vec![record("seal", 0, 20.0), record("seal", 1, 30.0)];
        let statuses = component_statuses(&records, &[], &RulConfig::default());
        assert_eq!(statuses.len(), 1);
        let s = &statuses[0];
        assert!((s.health_score - 70.0).abs() < 1e-9);
        assert!((s.predicted_failure_days - 21.0).abs() < 1e-9);
        assert!((s.degradation_rate - 1.5).abs() < 1e-9);
        assert!((s.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_health_score_floors_at_zero() {
        let records = vec![record("rotor", 0, 130.0)];
        let statuses = component_statuses(&records, &[], &RulConfig::default());
        assert!(statuses[0].health_score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_health_index_blend_and_discount() {
        let config = RulConfig::default();
        let components = component_statuses(&[record("seal", 0, 60.0)], &[], &config);
        // time health 50, component health 40 -> 0.6*50 + 0.4*40 = 46
        let hi = health_index(15.0, &components, 1.0, &config);
        assert!((hi - 46.0).abs() < 1e-9);
        // rapid degradation discounts 10%
        let hi_fast = health_index(15.0, &components, 3.0, &config);
        assert!((hi_fast - 41.4).abs() < 1e-9);
    }

    #[test]
    fn test_health_index_clamped() {
        let config = RulConfig::default();
        assert!((health_index(10_000.0, &[], 0.0, &config) - 100.0).abs() < f64::EPSILON);
        assert!(health_index(-50.0, &[], 0.0, &config).abs() < f64::EPSILON);
    }
}
