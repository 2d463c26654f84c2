//! Ensemble Anomaly Detection
//!
//! Three independent detectors run over the same time-ordered samples:
//!
//! | Detector | Flags when | Confidence |
//! |---|---|---|
//! | IQR | outside `[Q1 - k·IQR, Q3 + k·IQR]` | `0.5 + 0.1·ratio` |
//! | Z-score | `\|z\| > threshold` (global mean/std) | `\|z\| / 5` |
//! | Isolation window | `\|v - local mean\| / local std > threshold` | `0.45 + 0.1·ratio` |
//!
//! All confidences are capped at 0.95. Detections are merged by timestamp,
//! keeping the most confident one, and ranked by confidence. No randomness:
//! the same samples always give the same result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::TrendConfig;
use crate::stats::{clamp_confidence, mean, population_std_dev};
use crate::types::{
    AnomalyDetection, AnomalyLevel, AnomalyMethod, AnomalyPoint, AnomalySeverity, DetectorCounts,
    SensorSample, StatisticalSummary,
};

/// Run all detectors and merge their output
pub fn detect_anomalies(
    samples: &[SensorSample],
    summary: &StatisticalSummary,
    config: &TrendConfig,
) -> AnomalyDetection {
    let iqr = iqr_detector(samples, summary, config);
    let z = z_score_detector(samples, summary, config);
    let isolation = isolation_window_detector(samples, config);

    let detector_counts = DetectorCounts {
        iqr: iqr.len(),
        z_score: z.len(),
        isolation_window: isolation.len(),
    };

    let anomalies = merge(iqr.into_iter().chain(z).chain(isolation));
    let anomaly_rate = if samples.is_empty() {
        0.0
    } else {
        anomalies.len() as f64 / samples.len() as f64
    };
    let level = anomaly_level(anomaly_rate, config);

    AnomalyDetection {
        anomalies,
        anomaly_rate,
        level,
        recommendation: recommendation(level).to_string(),
        detector_counts,
    }
}

/// Keep the most confident detection per timestamp; earlier detectors win ties
fn merge(points: impl Iterator<Item = AnomalyPoint>) -> Vec<AnomalyPoint> {
    let mut by_timestamp: BTreeMap<DateTime<Utc>, AnomalyPoint> = BTreeMap::new();
    for point in points {
        match by_timestamp.get(&point.timestamp) {
            Some(existing) if existing.confidence >= point.confidence => {}
            _ => {
                by_timestamp.insert(point.timestamp, point);
            }
        }
    }

    let mut merged: Vec<AnomalyPoint> = by_timestamp.into_values().collect();
    merged.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(a.timestamp.cmp(&b.timestamp))
    });
    merged
}

pub fn anomaly_level(rate: f64, config: &TrendConfig) -> AnomalyLevel {
    if rate < config.anomaly_rate_elevated {
        AnomalyLevel::Normal
    } else if rate < config.anomaly_rate_high {
        AnomalyLevel::Elevated
    } else if rate < config.anomaly_rate_critical {
        AnomalyLevel::High
    } else {
        AnomalyLevel::Critical
    }
}

fn recommendation(level: AnomalyLevel) -> &'static str {
    match level {
        AnomalyLevel::Normal => "Anomaly rate within normal range - continue standard monitoring",
        AnomalyLevel::Elevated => "Elevated anomaly rate - review recent operating conditions",
        AnomalyLevel::High => "High anomaly rate - schedule an inspection of this sensor's equipment",
        AnomalyLevel::Critical => "Critical anomaly rate - investigate immediately",
    }
}

// ============================================================================
// Detectors
// ============================================================================

fn iqr_detector(
    samples: &[SensorSample],
    summary: &StatisticalSummary,
    config: &TrendConfig,
) -> Vec<AnomalyPoint> {
    // A zero IQR would flag every value that differs from the quartiles
    if summary.iqr <= f64::EPSILON {
        return Vec::new();
    }
    let lower = summary.q1 - config.iqr_multiplier * summary.iqr;
    let upper = summary.q3 + config.iqr_multiplier * summary.iqr;

    samples
        .iter()
        .filter(|s| s.value < lower || s.value > upper)
        .map(|s| {
            let deviation = (s.value - summary.median).abs();
            let ratio = deviation / summary.iqr;
            AnomalyPoint {
                timestamp: s.timestamp,
                value: s.value,
                expected_value: summary.median,
                deviation,
                severity: AnomalySeverity::from_ratio(ratio),
                confidence: clamp_confidence(0.5 + 0.1 * ratio),
                method: AnomalyMethod::Iqr,
                context: format!("Outside IQR bounds [{lower:.3}, {upper:.3}]"),
            }
        })
        .collect()
}

fn z_score_detector(
    samples: &[SensorSample],
    summary: &StatisticalSummary,
    config: &TrendConfig,
) -> Vec<AnomalyPoint> {
    if summary.std_dev <= f64::EPSILON {
        return Vec::new();
    }

    samples
        .iter()
        .filter_map(|s| {
            let z = (s.value - summary.mean) / summary.std_dev;
            (z.abs() > config.z_score_threshold).then(|| AnomalyPoint {
                timestamp: s.timestamp,
                value: s.value,
                expected_value: summary.mean,
                deviation: (s.value - summary.mean).abs(),
                severity: AnomalySeverity::from_ratio(z.abs()),
                confidence: clamp_confidence(z.abs() / 5.0),
                method: AnomalyMethod::ZScore,
                context: format!("Z-score {z:.2} against the window mean"),
            })
        })
        .collect()
}

/// Sliding window of `min(cap, n / divisor)` samples on each side of a point
fn isolation_window_detector(samples: &[SensorSample], config: &TrendConfig) -> Vec<AnomalyPoint> {
    let n = samples.len();
    let half_window = config
        .isolation_window_cap
        .min(n / config.isolation_window_divisor.max(1));
    if half_window == 0 {
        return Vec::new();
    }

    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let mut flagged = Vec::new();
    let mut neighbours: Vec<f64> = Vec::with_capacity(2 * half_window);

    for (i, sample) in samples.iter().enumerate() {
        neighbours.clear();
        let start = i.saturating_sub(half_window);
        let end = (i + half_window + 1).min(n);
        neighbours.extend_from_slice(&values[start..i]);
        neighbours.extend_from_slice(&values[i + 1..end]);
        if neighbours.len() < 2 {
            continue;
        }

        let local_mean = mean(&neighbours);
        let local_std = population_std_dev(&neighbours);
        if local_std <= f64::EPSILON {
            continue;
        }

        let deviation = (sample.value - local_mean).abs();
        let ratio = deviation / local_std;
        if ratio > config.isolation_threshold {
            flagged.push(AnomalyPoint {
                timestamp: sample.timestamp,
                value: sample.value,
                expected_value: local_mean,
                deviation,
                severity: AnomalySeverity::from_ratio(ratio),
                confidence: clamp_confidence(0.45 + 0.1 * ratio),
                method: AnomalyMethod::IsolationWindow,
                context: format!(
                    "{ratio:.1} local std-devs from {} neighbouring samples",
                    neighbours.len()
                ),
            });
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::statistics::summarize;
    use chrono::{Duration, TimeZone};

    fn series(values: &[f64]) -> Vec<SensorSample> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SensorSample::new(t0 + Duration::hours(i as i64), *v, "mm/s"))
            .collect()
    }

    fn run(values: &[f64]) -> AnomalyDetection {
        let config = TrendConfig::default();
        let samples = series(values);
        let raw: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let summary = summarize(&raw, &config);
        detect_anomalies(&samples, &summary, &config)
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n).map(|i| 50.0 + (i as f64 * 0.7).sin()).collect()
    }

    #[test]
    fn test_single_spike_flagged_by_all_detectors() {
        let mut values = wavy(100);
        values[60] = 80.0;
        let detection = run(&values);

        assert_eq!(detection.anomalies.len(), 1);
        let spike = &detection.anomalies[0];
        assert!((spike.value - 80.0).abs() < f64::EPSILON);
        assert_eq!(spike.severity, AnomalySeverity::Extreme);
        assert!((spike.confidence - 0.95).abs() < 1e-12);
        assert_eq!(detection.detector_counts.iqr, 1);
        assert_eq!(detection.detector_counts.z_score, 1);
        assert_eq!(detection.detector_counts.isolation_window, 1);
        assert_eq!(detection.level, AnomalyLevel::Normal);
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let detection = run(&[7.0; 50]);
        assert!(detection.anomalies.is_empty());
        assert!(detection.anomaly_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let mut values = wavy(120);
        values[10] = 70.0;
        values[90] = 20.0;
        values[91] = 25.0;
        assert_eq!(run(&values), run(&values));
    }

    #[test]
    fn test_ranked_by_confidence() {
        let mut values = wavy(100);
        values[20] = 56.0;
        values[70] = 90.0;
        let detection = run(&values);
        assert_eq!(detection.anomalies.len(), 2);
        for pair in detection.anomalies.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
            if (pair[0].confidence - pair[1].confidence).abs() < f64::EPSILON {
                assert!(pair[0].timestamp < pair[1].timestamp);
            }
        }
    }

    #[test]
    fn test_level_breakpoints() {
        let config = TrendConfig::default();
        assert_eq!(anomaly_level(0.049, &config), AnomalyLevel::Normal);
        assert_eq!(anomaly_level(0.05, &config), AnomalyLevel::Elevated);
        assert_eq!(anomaly_level(0.2, &config), AnomalyLevel::High);
        assert_eq!(anomaly_level(0.3, &config), AnomalyLevel::Critical);
    }
}
