//! Shared numeric helpers
//!
//! Descriptive statistics lean on `statrs`; the significance tests use a
//! deliberately simplified Student-t CDF (normal approximation with a
//! small-df correction). Swapping in the exact t-distribution would change
//! p-values near the cut-off and therefore which correlations get reported.

use statrs::function::erf::erf;
use statrs::statistics::Statistics;

/// Upper bound on any confidence score the core reports
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Clamp a confidence into `[0, MAX_CONFIDENCE]`; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_CONFIDENCE)
    }
}

/// Clamp a percentage-style score into `[0, 100]`; NaN becomes 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population standard deviation, 0 for fewer than two values
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Linear-interpolated percentile of an ascending slice, `p` in [0, 100]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Ordinary least-squares line `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// 0 when y has no variance
    pub r_squared: f64,
    /// Σ residual²
    pub ss_residual: f64,
    /// Σ (x - x̄)²
    pub sxx: f64,
    pub x_mean: f64,
    pub n: usize,
}

impl LinearFit {
    /// Fit against the sample index 0, 1, 2, ...
    pub fn over_index(y: &[f64]) -> Self {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        Self::fit(&x, y)
    }

    /// Fit `y` against `x`; slices are truncated to the shorter length
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        if n == 0 {
            return Self {
                slope: 0.0,
                intercept: 0.0,
                r_squared: 0.0,
                ss_residual: 0.0,
                sxx: 0.0,
                x_mean: 0.0,
                n,
            };
        }
        let (x, y) = (&x[..n], &y[..n]);
        let x_mean = mean(x);
        let y_mean = mean(y);

        let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
            .sum();
        let ss_total: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = y_mean - slope * x_mean;

        let ss_residual: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
            .sum();

        let r_squared = if ss_total > f64::EPSILON {
            (1.0 - ss_residual / ss_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            slope,
            intercept,
            r_squared,
            ss_residual,
            sxx,
            x_mean,
            n,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Root-mean-square residual
    pub fn rms_residual(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.ss_residual / self.n as f64).sqrt()
        }
    }

    /// Residual standard error with n - 2 degrees of freedom
    pub fn residual_std_error(&self) -> f64 {
        if self.n > 2 {
            (self.ss_residual / (self.n - 2) as f64).sqrt()
        } else {
            self.rms_residual()
        }
    }

    /// Approximate two-tailed p-value of the slope
    pub fn slope_p_value(&self) -> f64 {
        if self.n < 3 || self.sxx <= 0.0 {
            return 1.0;
        }
        let se = self.residual_std_error() / self.sxx.sqrt();
        if se <= f64::EPSILON {
            return if self.slope.abs() > f64::EPSILON { 0.0 } else { 1.0 };
        }
        two_tailed_p_value(self.slope / se, (self.n - 2) as f64)
    }
}

/// Pearson correlation coefficient
///
/// Formula: r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = (sxx * syy).sqrt();
    if denominator <= f64::EPSILON {
        0.0
    } else {
        (sxy / denominator).clamp(-1.0, 1.0)
    }
}

/// Simplified Student-t CDF.
///
/// Maps t onto a standard normal deviate with the correction
/// `z = t (1 - 1/(4 df)) / sqrt(1 + t² / (2 df))` and evaluates Φ(z) via `erf`.
/// Close to the exact CDF for df >= 10, looser for very small samples.
pub fn approx_student_t_cdf(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return if t > 0.0 { 1.0 } else { 0.0 };
    }
    if df <= 0.0 {
        return 0.5;
    }
    let z = t * (1.0 - 1.0 / (4.0 * df)) / (1.0 + t * t / (2.0 * df)).sqrt();
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Two-tailed p-value for a t statistic under the simplified CDF
pub fn two_tailed_p_value(t: f64, df: f64) -> f64 {
    (2.0 * (1.0 - approx_student_t_cdf(t.abs(), df))).clamp(0.0, 1.0)
}

/// Significance of a Pearson r over n pairs: t = r·sqrt((n-2)/(1-r²))
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    // Perfect or near-perfect correlation is highly significant
    if r.abs() >= 0.9999 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    two_tailed_p_value(t, df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&sorted, 100.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let y: Vec<f64> = (0..20).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = LinearFit::over_index(&y);
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 3.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!(fit.rms_residual() < 1e-9);
        assert!(fit.slope_p_value() < 1e-6);
    }

    #[test]
    fn test_linear_fit_constant_series() {
        let fit = LinearFit::over_index(&[5.0; 12]);
        assert!(fit.slope.abs() < 1e-12);
        assert!(fit.r_squared.abs() < 1e-12);
        assert!((fit.slope_p_value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((pearson(&x, &y) + 1.0).abs() < 1e-9);
        assert!(correlation_p_value(-1.0, 50) < 1e-9);
    }

    #[test]
    fn test_pearson_zero_variance() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 4.0, 4.0];
        assert!(pearson(&x, &y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_approx_t_cdf_shape() {
        assert!((approx_student_t_cdf(0.0, 10.0) - 0.5).abs() < 1e-12);
        // Exact two-tailed p for t=2.228, df=10 is 0.05
        let p = two_tailed_p_value(2.228, 10.0);
        assert!(p > 0.03 && p < 0.07, "p = {p}");
        // r=0.5, n=30 should give p ≈ 0.005
        let p = correlation_p_value(0.5, 30);
        assert!(p > 0.001 && p < 0.01, "p = {p}");
        // r=0.2, n=30 should give p ≈ 0.29
        assert!(correlation_p_value(0.2, 30) > 0.2);
    }

    #[test]
    fn test_clamps() {
        assert!((clamp_confidence(1.7) - MAX_CONFIDENCE).abs() < f64::EPSILON);
        assert!(clamp_confidence(-0.3).abs() < f64::EPSILON);
        assert!(clamp_confidence(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_percent(140.0) - 100.0).abs() < f64::EPSILON);
        assert!(clamp_percent(-3.0).abs() < f64::EPSILON);
    }
}
