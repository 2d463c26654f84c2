//! Seasonality detection by autocorrelation at candidate periods
//!
//! Candidate periods (daily, weekly, shift, maintenance cycle) are converted
//! into sample lags with the mean sampling interval. A lag is only tested when
//! at least two full periods fit in the series. The series is linearly
//! detrended first so a steady ramp does not read as a long cycle.

use crate::config::TrendConfig;
use crate::stats::{mean, LinearFit};
use crate::types::{DominantPeriod, SeasonalCandidate, Seasonality, SensorSample};

/// Mean spacing between consecutive samples in hours, `None` when not positive
pub fn mean_interval_hours(samples: &[SensorSample]) -> Option<f64> {
    let (first, last) = (samples.first()?, samples.last()?);
    if samples.len() < 2 {
        return None;
    }
    let span_hours = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 3_600_000.0;
    let interval = span_hours / (samples.len() - 1) as f64;
    (interval > 0.0).then_some(interval)
}

/// Autocorrelation of `values` at `lag`, 0 for a flat series
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag == 0 || lag >= n {
        return 0.0;
    }
    let m = mean(values);
    let denominator: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denominator <= f64::EPSILON {
        return 0.0;
    }
    let numerator: f64 = (0..n - lag)
        .map(|i| (values[i] - m) * (values[i + lag] - m))
        .sum();
    numerator / denominator
}

pub fn detect_seasonality(samples: &[SensorSample], config: &TrendConfig) -> Seasonality {
    let raw: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let fit = LinearFit::over_index(&raw);
    let values: Vec<f64> = raw
        .iter()
        .enumerate()
        .map(|(i, v)| v - fit.predict(i as f64))
        .collect();
    let n = values.len();

    let Some(interval_hours) = mean_interval_hours(samples) else {
        return Seasonality {
            detected: false,
            strength: 0.0,
            candidates: Vec::new(),
            dominant: None,
        };
    };

    let candidates: Vec<SeasonalCandidate> = config
        .seasonal_periods
        .iter()
        .filter_map(|period| {
            let lag = (period.hours / interval_hours).round() as usize;
            if lag < 2 || lag > n / 2 {
                return None;
            }
            let ac = autocorrelation(&values, lag);
            Some(SeasonalCandidate {
                name: period.name.clone(),
                period_hours: period.hours,
                lag_samples: lag,
                autocorrelation: ac,
                qualifies: ac.abs() > config.autocorrelation_threshold,
            })
        })
        .collect();

    let strength = candidates
        .iter()
        .map(|c| c.autocorrelation.abs())
        .fold(0.0, f64::max);

    let dominant = candidates
        .iter()
        .filter(|c| c.qualifies)
        .max_by(|a, b| a.autocorrelation.abs().total_cmp(&b.autocorrelation.abs()))
        .map(|c| {
            let amplitude = profile_amplitude(&phase_profile(&values, c.lag_samples));
            let peak_offset = best_phase_offset(&values, c.lag_samples);
            DominantPeriod {
                name: c.name.clone(),
                period_hours: c.period_hours,
                lag_samples: c.lag_samples,
                strength: c.autocorrelation.abs(),
                amplitude,
                phase_hours: peak_offset as f64 * interval_hours,
            }
        });

    Seasonality {
        detected: dominant.is_some(),
        strength,
        candidates,
        dominant,
    }
}

/// Mean value at each position within the period
pub fn phase_profile(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, v) in values.iter().enumerate() {
        sums[i % period] += v;
        counts[i % period] += 1;
    }
    sums.iter()
        .zip(&counts)
        .map(|(s, c)| if *c == 0 { 0.0 } else { s / *c as f64 })
        .collect()
}

/// Half the peak-to-trough spread of the phase profile.
///
/// A robust stand-in for the mean deviation of each period segment: averaging
/// every cycle first keeps a single noisy segment from inflating it.
fn profile_amplitude(profile: &[f64]) -> f64 {
    let (min, max) = profile
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if profile.is_empty() {
        0.0
    } else {
        (max - min) / 2.0
    }
}

/// Offset in samples, within one period, of the cosine that best matches the
/// detrended series. Brute-force search over every offset in `0..period`.
fn best_phase_offset(values: &[f64], period: usize) -> usize {
    (0..period)
        .map(|k| {
            let score: f64 = values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v * (std::f64::consts::TAU * (i as f64 - k as f64) / period as f64).cos()
                })
                .sum();
            (k, score)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(k, _)| k)
}
