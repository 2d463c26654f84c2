//! Cross-Sensor Correlation
//!
//! Compares the analyzed stream with every other sensor stream on the same
//! asset.
//!
//! ## Steps
//! - Align the two streams: each sample pairs with the nearest sample of the
//!   other stream within the timestamp tolerance
//! - Pearson r over the aligned pairs, with a simplified t-test p-value
//! - Lag scan over ±N steps to find which stream leads
//! - Keep pairs with |r| above the reporting floor or p below the significance level

use crate::config::TrendConfig;
use crate::stats::{correlation_p_value, pearson};
use crate::types::{
    Causality, CorrelationStrength, LagAnalysis, Relationship, SensorCorrelation, SensorSample,
};

/// Pairs of (primary, other) values aligned within `tolerance_secs`.
///
/// Both inputs must be sorted by timestamp.
pub fn align_streams(
    primary: &[SensorSample],
    other: &[SensorSample],
    tolerance_secs: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    if other.is_empty() {
        return (xs, ys);
    }

    let tolerance_ms = (tolerance_secs * 1000.0) as i64;
    let mut j = 0;
    for sample in primary {
        while j + 1 < other.len() && other[j + 1].timestamp <= sample.timestamp {
            j += 1;
        }
        let gap = |k: usize| (other[k].timestamp - sample.timestamp).num_milliseconds().abs();
        let nearest = if j + 1 < other.len() && gap(j + 1) < gap(j) {
            j + 1
        } else {
            j
        };
        if gap(nearest) <= tolerance_ms {
            xs.push(sample.value);
            ys.push(other[nearest].value);
        }
    }
    (xs, ys)
}

pub fn strength_of(r: f64) -> CorrelationStrength {
    let magnitude = r.abs();
    if magnitude < 0.4 {
        CorrelationStrength::Weak
    } else if magnitude < 0.6 {
        CorrelationStrength::Moderate
    } else if magnitude < 0.8 {
        CorrelationStrength::Strong
    } else {
        CorrelationStrength::VeryStrong
    }
}

/// Heuristic only: a lagged relationship is suggestive, never proof
pub fn causality_of(r: f64, lag: &LagAnalysis) -> Causality {
    if r.abs() < 0.3 {
        return Causality::None;
    }
    let lagged = lag.best_lag_steps != 0;
    let lag_r = lag.lag_correlation.abs();
    if lagged && lag.best_lag_steps.abs() <= 3 && lag_r >= 0.8 {
        Causality::Strong
    } else if lagged && lag_r >= 0.6 {
        Causality::Likely
    } else {
        Causality::Possible
    }
}

/// Best lag in `[-max_lag, max_lag]` by |r|; the smallest |lag| wins ties.
///
/// A positive lag pairs `x[i]` with `y[i + lag]`, so `x` leads.
pub fn lag_scan(x: &[f64], y: &[f64], max_lag: usize, min_points: usize) -> (i32, f64) {
    let n = x.len().min(y.len());
    let mut best = (0i32, pearson(&x[..n], &y[..n]));

    for step in 1..=max_lag {
        if n < step + min_points {
            break;
        }
        for (lag, r) in [
            (step as i32, pearson(&x[..n - step], &y[step..n])),
            (-(step as i32), pearson(&x[step..n], &y[..n - step])),
        ] {
            if r.abs() > best.1.abs() + 1e-12 {
                best = (lag, r);
            }
        }
    }
    best
}

/// Correlation of the analyzed stream against one other sensor stream.
///
/// `None` when fewer than the minimum pairs align or the pair is not worth reporting.
pub fn correlate(
    sensor_type: &str,
    primary: &[SensorSample],
    other_type: &str,
    other: &[SensorSample],
    config: &TrendConfig,
) -> Option<SensorCorrelation> {
    let (xs, ys) = align_streams(primary, other, config.alignment_tolerance_secs);
    let n = xs.len();
    if n < config.min_aligned_points {
        return None;
    }

    let correlation = pearson(&xs, &ys);
    let p_value = correlation_p_value(correlation, n);
    if correlation.abs() <= config.report_correlation_above && p_value >= config.significance_level {
        return None;
    }

    let (best_lag_steps, lag_correlation) =
        lag_scan(&xs, &ys, config.max_lag_steps, config.min_aligned_points);
    let leading_sensor = match best_lag_steps {
        0 => None,
        lag if lag > 0 => Some(sensor_type.to_string()),
        _ => Some(other_type.to_string()),
    };
    let lag = LagAnalysis {
        best_lag_steps,
        lag_correlation,
        leading_sensor,
    };

    Some(SensorCorrelation {
        sensor_type: other_type.to_string(),
        correlation,
        p_value,
        aligned_points: n,
        relationship: if correlation >= 0.0 {
            Relationship::Positive
        } else {
            Relationship::Negative
        },
        strength: strength_of(correlation),
        causality: causality_of(correlation, &lag),
        lag,
    })
}

/// Sort reported correlations by |r|, strongest first
pub fn rank_correlations(correlations: &mut [SensorCorrelation]) {
    correlations.sort_by(|a, b| {
        b.correlation
            .abs()
            .total_cmp(&a.correlation.abs())
            .then_with(|| a.sensor_type.cmp(&b.sensor_type))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn stream(values: &[f64], offset_secs: i64) -> Vec<SensorSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                SensorSample::new(
                    t0() + Duration::minutes(10 * i as i64) + Duration::seconds(offset_secs),
                    *v,
                    "",
                )
            })
            .collect()
    }

    fn signal(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.4).sin() * 10.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn test_negated_stream_is_very_strong_negative() {
        let x = signal(60);
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        let c = correlate("temperature", &stream(&x, 0), "pressure", &stream(&y, 30), &TrendConfig::default())
            .unwrap();
        assert!((c.correlation + 1.0).abs() < 1e-9);
        assert_eq!(c.relationship, Relationship::Negative);
        assert_eq!(c.strength, CorrelationStrength::VeryStrong);
        assert_eq!(c.aligned_points, 60);
        assert_eq!(c.lag.best_lag_steps, 0);
        assert_eq!(c.causality, Causality::Possible);
    }

    #[test]
    fn test_alignment_tolerance() {
        let x = signal(20);
        let lone = vec![SensorSample::new(t0() + Duration::minutes(6), 1.0, "")];
        // 6 minutes from the first sample, 4 from the second
        let (xs, ys) = align_streams(&stream(&x, 0), &lone, 300.0);
        assert_eq!(xs, vec![x[1]]);
        assert_eq!(ys, vec![1.0]);

        let (xs, ys) = align_streams(&stream(&x, 0), &stream(&x, 120), 300.0);
        assert_eq!(xs.len(), 20);
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_too_few_aligned_points() {
        let x = signal(8);
        assert!(correlate("a", &stream(&x, 0), "b", &stream(&x, 0), &TrendConfig::default()).is_none());
    }

    #[test]
    fn test_leading_stream_detected() {
        // y follows x two steps later
        let base: Vec<f64> = (0..80).map(|i| (i as f64 * 0.3).sin() * 5.0).collect();
        let x = base[2..].to_vec();
        let y = base[..78].to_vec();
        let c = correlate("vibration", &stream(&x, 0), "temperature", &stream(&y, 0), &TrendConfig::default());
        let c = c.unwrap();
        assert_eq!(c.lag.best_lag_steps, 2);
        assert_eq!(c.lag.leading_sensor.as_deref(), Some("vibration"));
        assert!((c.lag.lag_correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_causality_buckets() {
        let lag = |steps, r| LagAnalysis {
            best_lag_steps: steps,
            lag_correlation: r,
            leading_sensor: None,
        };
        assert_eq!(causality_of(0.2, &lag(1, 0.9)), Causality::None);
        assert_eq!(causality_of(0.5, &lag(2, 0.85)), Causality::Strong);
        assert_eq!(causality_of(0.5, &lag(6, 0.7)), Causality::Likely);
        assert_eq!(causality_of(0.5, &lag(0, 0.5)), Causality::Possible);
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(strength_of(0.39), CorrelationStrength::Weak);
        assert_eq!(strength_of(-0.5), CorrelationStrength::Moderate);
        assert_eq!(strength_of(0.79), CorrelationStrength::Strong);
        assert_eq!(strength_of(-0.8), CorrelationStrength::VeryStrong);
    }
}
