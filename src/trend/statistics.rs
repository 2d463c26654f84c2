//! Descriptive statistics and linear trend of one sensor stream

use crate::config::TrendConfig;
use crate::stats::{mean, percentile, population_std_dev, LinearFit};
use crate::types::{LinearTrend, NormalityCheck, StatisticalSummary, TrendDirection};

/// Tolerances of the 68/95 rule check
const ONE_SIGMA_EXPECTED: f64 = 0.68;
const ONE_SIGMA_TOLERANCE: f64 = 0.10;
const TWO_SIGMA_EXPECTED: f64 = 0.95;
const TWO_SIGMA_TOLERANCE: f64 = 0.05;

/// Summary of time-ordered values. Callers guarantee a non-empty slice.
pub fn summarize(values: &[f64], config: &TrendConfig) -> StatisticalSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = mean(values);
    let std_dev = population_std_dev(values);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let (skewness, kurtosis) = shape(values, mean, std_dev);

    StatisticalSummary {
        sample_count: values.len(),
        mean,
        median: percentile(&sorted, 50.0),
        std_dev,
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        q1,
        q3,
        iqr: q3 - q1,
        skewness,
        kurtosis,
        normality: normality(values, mean, std_dev),
        trend: linear_trend(values, config),
    }
}

/// Moment skewness and excess kurtosis; both 0 for a flat series
fn shape(values: &[f64], mean: f64, std_dev: f64) -> (f64, f64) {
    if std_dev <= f64::EPSILON || values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let (m3, m4) = values.iter().fold((0.0, 0.0), |(m3, m4), v| {
        let z = (v - mean) / std_dev;
        (m3 + z.powi(3), m4 + z.powi(4))
    });
    (m3 / n, m4 / n - 3.0)
}

/// Coarse normality check against the 68/95 rule.
///
/// An approximation only: a Shapiro-Wilk test would flag noticeably
/// different series.
pub fn normality(values: &[f64], mean: f64, std_dev: f64) -> NormalityCheck {
    if values.is_empty() {
        return NormalityCheck {
            within_one_sigma: 0.0,
            within_two_sigma: 0.0,
            is_approximately_normal: false,
        };
    }
    let n = values.len() as f64;
    let within = |k: f64| {
        values
            .iter()
            .filter(|v| (*v - mean).abs() <= k * std_dev)
            .count() as f64
            / n
    };
    let within_one_sigma = within(1.0);
    let within_two_sigma = within(2.0);

    NormalityCheck {
        within_one_sigma,
        within_two_sigma,
        is_approximately_normal: (within_one_sigma - ONE_SIGMA_EXPECTED).abs() <= ONE_SIGMA_TOLERANCE
            && (within_two_sigma - TWO_SIGMA_EXPECTED).abs() <= TWO_SIGMA_TOLERANCE,
    }
}

/// OLS trend over sample index.
///
/// A flat slope is `stable` before anything else; a poor fit is `volatile`.
pub fn linear_trend(values: &[f64], config: &TrendConfig) -> LinearTrend {
    let fit = LinearFit::over_index(values);

    let direction = if fit.slope.abs() < config.stable_slope {
        TrendDirection::Stable
    } else if fit.r_squared < config.volatile_r_squared {
        TrendDirection::Volatile
    } else if fit.slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    LinearTrend {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        p_value: fit.slope_p_value(),
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_summary() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let s = summarize(&values, &TrendConfig::default());
        assert_eq!(s.sample_count, 9);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.median - 5.0).abs() < 1e-12);
        assert!((s.q1 - 3.0).abs() < 1e-12);
        assert!((s.q3 - 7.0).abs() < 1e-12);
        assert!((s.iqr - 4.0).abs() < 1e-12);
        assert!(s.skewness.abs() < 1e-12);
        assert!((s.min - 1.0).abs() < f64::EPSILON);
        assert!((s.max - 9.0).abs() < f64::EPSILON);
        assert_eq!(s.trend.direction, TrendDirection::Increasing);
        assert!((s.trend.r_squared - 1.0).abs() < 1e-12);
        assert!(s.trend.p_value < 0.01);
    }

    #[test]
    fn test_flat_series_is_stable() {
        let values = vec![42.0; 20];
        let s = summarize(&values, &TrendConfig::default());
        assert!(s.std_dev.abs() < f64::EPSILON);
        assert_eq!(s.trend.direction, TrendDirection::Stable);
        assert!(s.kurtosis.abs() < f64::EPSILON);
        assert!((s.normality.within_one_sigma - 1.0).abs() < f64::EPSILON);
        assert!(!s.normality.is_approximately_normal);
    }

    #[test]
    fn test_zigzag_is_volatile() {
        let values: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 10.0 } else { -10.0 } + 0.05 * i as f64)
            .collect();
        let trend = linear_trend(&values, &TrendConfig::default());
        assert_eq!(trend.direction, TrendDirection::Volatile);
    }

    #[test]
    fn test_right_skew_detected() {
        let mut values = vec![1.0; 30];
        values.extend([10.0, 12.0, 15.0]);
        let s = summarize(&values, &TrendConfig::default());
        assert!(s.skewness > 1.0);
    }
}
