//! Short-horizon forecasting
//!
//! ## Method selection
//! 1. **Seasonal decomposition** when seasonality strength exceeds the
//!    threshold and two full dominant periods are available
//! 2. **Linear trend** when the trend R² exceeds its threshold
//! 3. **Exponential smoothing** otherwise
//!
//! Accuracy figures are in-sample (no hold-out split). Intervals are ±1.96
//! residual standard errors.

use chrono::Duration;

use crate::config::TrendConfig;
use crate::stats::{mean, LinearFit};
use crate::types::{
    Forecast, ForecastAccuracy, ForecastMethod, ForecastPoint, Seasonality, SensorSample,
    StatisticalSummary,
};

use super::seasonality::{mean_interval_hours, phase_profile};

const Z_95: f64 = 1.96;

pub fn forecast(
    samples: &[SensorSample],
    summary: &StatisticalSummary,
    seasonality: &Seasonality,
    config: &TrendConfig,
) -> Forecast {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let interval_hours = mean_interval_hours(samples).unwrap_or(1.0);

    let seasonal_lag = seasonality
        .dominant
        .as_ref()
        .filter(|_| seasonality.strength > config.seasonal_strength_threshold)
        .map(|d| d.lag_samples)
        .filter(|lag| *lag >= 2 && values.len() >= 2 * lag);

    let (method, model) = match seasonal_lag {
        Some(lag) => (ForecastMethod::Seasonal, Model::seasonal(&values, lag)),
        None if summary.trend.r_squared > config.linear_r_squared_threshold => {
            (ForecastMethod::Linear, Model::linear(&values))
        }
        None => (
            ForecastMethod::ExponentialSmoothing,
            Model::exponential(&values, config.smoothing_alpha),
        ),
    };

    let Some(last) = samples.last() else {
        return Forecast {
            method,
            horizon_hours: config.forecast_horizon_hours,
            points: Vec::new(),
            accuracy: ForecastAccuracy::default(),
        };
    };

    let last_index = (values.len() - 1) as f64;
    let points = (1..=config.forecast_horizon_hours)
        .map(|h| {
            let steps_ahead = f64::from(h) / interval_hours;
            let (value, half_width) = model.predict(last_index + steps_ahead, steps_ahead);
            ForecastPoint {
                timestamp: last.timestamp + Duration::hours(i64::from(h)),
                value,
                lower_bound: value - half_width,
                upper_bound: value + half_width,
            }
        })
        .collect();

    Forecast {
        method,
        horizon_hours: config.forecast_horizon_hours,
        points,
        accuracy: model.accuracy,
    }
}

/// A fitted model: point prediction plus its interval half-width
struct Model {
    kind: ModelKind,
    accuracy: ForecastAccuracy,
}

enum ModelKind {
    Linear(LinearFit),
    Exponential { level: f64, rmse: f64, alpha: f64 },
    Seasonal { fit: LinearFit, profile: Vec<f64>, rmse: f64 },
}

impl Model {
    fn linear(values: &[f64]) -> Self {
        let fit = LinearFit::over_index(values);
        let fitted: Vec<f64> = (0..values.len()).map(|i| fit.predict(i as f64)).collect();
        Self {
            accuracy: accuracy(values, &fitted),
            kind: ModelKind::Linear(fit),
        }
    }

    /// Simple exponential smoothing; accuracy from one-step-ahead predictions
    fn exponential(values: &[f64], alpha: f64) -> Self {
        let mut level = values.first().copied().unwrap_or(0.0);
        let mut one_step = Vec::with_capacity(values.len().saturating_sub(1));
        for v in values.iter().skip(1) {
            one_step.push(level);
            level = alpha * v + (1.0 - alpha) * level;
        }
        let actual = values.get(1..).unwrap_or(&[]);
        let accuracy = accuracy(actual, &one_step);
        Self {
            kind: ModelKind::Exponential {
                level,
                rmse: accuracy.rmse,
                alpha,
            },
            accuracy,
        }
    }

    /// Linear trend plus the mean detrended profile over one period.
    ///
    /// The trend is fitted on a roughly deseasonalized series so a cycle does
    /// not leak into the slope.
    fn seasonal(values: &[f64], period: usize) -> Self {
        let level = mean(values);
        let rough = phase_profile(values, period);
        let deseasonalized: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| v - (rough[i % period] - level))
            .collect();
        let fit = LinearFit::over_index(&deseasonalized);
        let detrended: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| v - fit.predict(i as f64))
            .collect();
        let profile = phase_profile(&detrended, period);
        let fitted: Vec<f64> = (0..values.len())
            .map(|i| fit.predict(i as f64) + profile[i % period])
            .collect();
        let accuracy = accuracy(values, &fitted);
        Self {
            kind: ModelKind::Seasonal {
                fit,
                profile,
                rmse: accuracy.rmse,
            },
            accuracy,
        }
    }

    fn predict(&self, x: f64, steps_ahead: f64) -> (f64, f64) {
        match &self.kind {
            ModelKind::Linear(fit) => {
                let leverage = if fit.sxx > 0.0 && fit.n > 0 {
                    1.0 + 1.0 / fit.n as f64 + (x - fit.x_mean).powi(2) / fit.sxx
                } else {
                    1.0
                };
                (fit.predict(x), Z_95 * fit.residual_std_error() * leverage.sqrt())
            }
            ModelKind::Exponential { level, rmse, alpha } => {
                let horizon_growth = 1.0 + (steps_ahead - 1.0).max(0.0) * alpha * alpha;
                (*level, Z_95 * rmse * horizon_growth.sqrt())
            }
            ModelKind::Seasonal { fit, profile, rmse } => {
                let period = profile.len().max(1);
                let position = (x.round().max(0.0) as usize) % period;
                let seasonal = profile.get(position).copied().unwrap_or(0.0);
                (fit.predict(x) + seasonal, Z_95 * rmse)
            }
        }
    }
}

/// MAE, RMSE and MAPE (percent, zero actuals skipped)
fn accuracy(actual: &[f64], predicted: &[f64]) -> ForecastAccuracy {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return ForecastAccuracy::default();
    }
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut pct_count = 0usize;
    for (a, p) in actual.iter().zip(predicted).take(n) {
        let err = a - p;
        abs_sum += err.abs();
        sq_sum += err * err;
        if a.abs() > f64::EPSILON {
            pct_sum += (err / a).abs();
            pct_count += 1;
        }
    }
    ForecastAccuracy {
        mae: abs_sum / n as f64,
        rmse: (sq_sum / n as f64).sqrt(),
        mape: if pct_count == 0 {
            0.0
        } else {
            pct_sum / pct_count as f64 * 100.0
        },
    }
}
