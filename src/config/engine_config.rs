//! Engine Configuration - RUL, trend and fleet constants as TOML values
//!
//! Each struct implements `Default` with the reference constants, so a missing
//! file or a partial file behaves exactly like the built-in model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable holding an explicit config path
pub const CONFIG_ENV_VAR: &str = "PROGNOSTICS_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "prognostics.toml";

/// Upper bound on the RUL degradation history window (ten years)
pub const MAX_HISTORY_WINDOW_DAYS: i64 = 3650;

/// Upper bound on the default trend window (ten years)
pub const MAX_TREND_WINDOW_HOURS: u32 = 87_600;

// ============================================================================
// Top-Level Config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rul: RulConfig,

    #[serde(default)]
    pub trend: TrendConfig,

    #[serde(default)]
    pub fleet: FleetConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PROGNOSTICS_CONFIG`
    /// 2. `./prognostics.toml`
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency, collecting every violation.
    ///
    /// Rules:
    /// - Risk bands escalate: critical is stricter than high, high stricter than medium
    /// - Buffers are non-negative (they only ever widen the higher-risk band)
    /// - Windows are positive and bounded, sample minimums and horizons are positive
    /// - Health blend weight and rapid-degradation discount lie in [0, 1]
    /// - Smoothing alpha lies in (0, 1)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let r = &self.rul;
        if !(1..=MAX_HISTORY_WINDOW_DAYS).contains(&r.history_window_days) {
            errors.push(format!(
                "rul.history_window_days must be in 1..={MAX_HISTORY_WINDOW_DAYS} (got {})",
                r.history_window_days
            ));
        }
        for (name, value) in [
            ("rul.health_time_weight", r.health_time_weight),
            ("rul.rapid_degradation_discount", r.rapid_degradation_discount),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be in [0, 1] (got {value})"));
            }
        }
        if r.min_pattern_samples < 3 {
            errors.push("rul.min_pattern_samples must be >= 3".to_string());
        }
        if r.confidence_sample_cap == 0 {
            errors.push("rul.confidence_sample_cap must be > 0".to_string());
        }
        if r.max_recommendations == 0 {
            errors.push("rul.max_recommendations must be > 0".to_string());
        }
        for (name, value) in [
            ("rul.default_horizon_days", r.default_horizon_days),
            ("rul.reference_days", r.reference_days),
            ("rul.reference_rate_per_day", r.reference_rate_per_day),
            ("rul.reference_acceleration", r.reference_acceleration),
            ("rul.health_index_horizon_days", r.health_index_horizon_days),
        ] {
            Self::check_positive(value, name, &mut errors);
        }

        let weight_sum = r.time_weight + r.rate_weight + r.acceleration_weight;
        if !(0.95..=1.05).contains(&weight_sum) {
            errors.push(format!(
                "rul probability weights must sum to ~1.0, got {weight_sum:.2}"
            ));
        }

        let b = &r.risk_bands;
        for (name, band) in [
            ("critical", &b.critical),
            ("high", &b.high),
            ("medium", &b.medium),
        ] {
            band.check(name, &mut errors);
        }
        Self::check_band_order(&b.high, &b.critical, "high", "critical", &mut errors);
        Self::check_band_order(&b.medium, &b.high, "medium", "high", &mut errors);

        let t = &self.trend;
        if !(1..=MAX_TREND_WINDOW_HOURS).contains(&t.default_window_hours) {
            errors.push(format!(
                "trend.default_window_hours must be in 1..={MAX_TREND_WINDOW_HOURS} (got {})",
                t.default_window_hours
            ));
        }
        if t.min_samples < 3 {
            errors.push("trend.min_samples must be >= 3".to_string());
        }
        if !(t.smoothing_alpha > 0.0 && t.smoothing_alpha < 1.0) {
            errors.push(format!(
                "trend.smoothing_alpha must be in (0, 1), got {}",
                t.smoothing_alpha
            ));
        }
        if t.forecast_horizon_hours == 0 {
            errors.push("trend.forecast_horizon_hours must be > 0".to_string());
        }
        if t.isolation_window_cap == 0 {
            errors.push("trend.isolation_window_cap must be > 0".to_string());
        }
        if t.min_aligned_points < 3 {
            errors.push("trend.min_aligned_points must be >= 3".to_string());
        }
        for (name, value) in [
            ("trend.iqr_multiplier", t.iqr_multiplier),
            ("trend.z_score_threshold", t.z_score_threshold),
            ("trend.isolation_threshold", t.isolation_threshold),
            ("trend.alignment_tolerance_secs", t.alignment_tolerance_secs),
        ] {
            Self::check_positive(value, name, &mut errors);
        }
        if t.seasonal_periods.iter().any(|p| !(p.hours.is_finite() && p.hours > 0.0)) {
            errors.push("trend.seasonal_periods hours must be positive".to_string());
        }
        if !(t.anomaly_rate_elevated < t.anomaly_rate_high
            && t.anomaly_rate_high < t.anomaly_rate_critical)
        {
            errors.push(
                "trend anomaly rate breakpoints must increase: elevated < high < critical"
                    .to_string(),
            );
        }

        let f = &self.fleet;
        if f.sensors_per_equipment == 0 {
            errors.push("fleet.sensors_per_equipment must be > 0".to_string());
        }
        if !(f.medium_anomaly_rate < f.high_anomaly_rate
            && f.high_anomaly_rate < f.critical_anomaly_rate)
        {
            errors.push("fleet anomaly rate breakpoints must increase".to_string());
        }
        if !(f.medium_health_score > f.high_health_score
            && f.high_health_score > f.critical_health_score)
        {
            errors.push("fleet health score breakpoints must decrease with severity".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be a positive finite number (got {value})"));
        }
    }

    fn check_band_order(
        lower: &RiskBand,
        higher: &RiskBand,
        lower_name: &str,
        higher_name: &str,
        errors: &mut Vec<String>,
    ) {
        if higher.probability < lower.probability {
            errors.push(format!(
                "risk_bands.{higher_name}.probability ({:.2}) must be >= {lower_name}.probability ({:.2})",
                higher.probability, lower.probability
            ));
        }
        if higher.remaining_days > lower.remaining_days {
            errors.push(format!(
                "risk_bands.{higher_name}.remaining_days ({:.1}) must be <= {lower_name}.remaining_days ({:.1})",
                higher.remaining_days, lower.remaining_days
            ));
        }
        if higher.health_index > lower.health_index {
            errors.push(format!(
                "risk_bands.{higher_name}.health_index ({:.1}) must be <= {lower_name}.health_index ({:.1})",
                higher.health_index, lower.health_index
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// RUL Engine
// ============================================================================

/// One risk level's entry thresholds.
///
/// A level is entered when ANY signal crosses: probability above, remaining
/// days below, or health index below. The buffers widen the band toward the
/// higher-risk side only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub probability: f64,
    pub remaining_days: f64,
    pub health_index: f64,
    pub probability_buffer: f64,
    pub days_buffer: f64,
    pub health_buffer: f64,
}

impl RiskBand {
    const fn new(probability: f64, remaining_days: f64, health_index: f64, days_buffer: f64) -> Self {
        Self {
            probability,
            remaining_days,
            health_index,
            probability_buffer: 0.05,
            days_buffer,
            health_buffer: 5.0,
        }
    }

    fn check(&self, name: &str, errors: &mut Vec<String>) {
        for (field, value) in [
            ("probability_buffer", self.probability_buffer),
            ("days_buffer", self.days_buffer),
            ("health_buffer", self.health_buffer),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("risk_bands.{name}.{field} must be >= 0 (got {value})"));
            }
        }
        if !(0.0..=1.0).contains(&self.probability) {
            errors.push(format!("risk_bands.{name}.probability must be within [0, 1]"));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBandsConfig {
    pub critical: RiskBand,
    pub high: RiskBand,
    pub medium: RiskBand,
}

impl Default for RiskBandsConfig {
    fn default() -> Self {
        Self {
            critical: RiskBand::new(0.70, 7.0, 30.0, 2.0),
            high: RiskBand::new(0.50, 21.0, 50.0, 4.0),
            medium: RiskBand::new(0.30, 45.0, 70.0, 5.0),
        }
    }
}

/// Limits that mark a component's condition-monitoring channel as critical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalMetricLimits {
    pub vibration_max: f64,
    pub temperature_max: f64,
    pub oil_condition_min: f64,
    pub wear_particles_max: f64,
}

impl Default for CriticalMetricLimits {
    fn default() -> Self {
        Self {
            vibration_max: 10.0,
            temperature_max: 80.0,
            oil_condition_min: 40.0,
            wear_particles_max: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulConfig {
    /// Degradation history window read per calculation
    pub history_window_days: i64,
    /// Minimum ordered measurements before a component trend is fitted
    pub min_pattern_samples: usize,
    /// Sample count at which fit confidence stops growing
    pub confidence_sample_cap: usize,
    /// Remaining days reported when nothing is approaching failure
    pub default_horizon_days: f64,
    /// Confidence reported when no fit and no ML prediction exist
    pub fallback_confidence: f64,
    /// Failure-probability blend (no ML prediction)
    pub time_weight: f64,
    pub rate_weight: f64,
    pub acceleration_weight: f64,
    pub reference_days: f64,
    pub reference_rate_per_day: f64,
    pub reference_acceleration: f64,
    pub min_failure_probability: f64,
    pub max_failure_probability: f64,
    /// Remaining days that map to a time-based health of 100
    pub health_index_horizon_days: f64,
    /// Weight of the time-based health vs. mean component health
    pub health_time_weight: f64,
    /// Governing rate (points/day) above which health is discounted
    pub rapid_degradation_rate: f64,
    pub rapid_degradation_discount: f64,
    /// Fraction of health score used as a days-to-failure fallback
    pub component_days_per_health_point: f64,
    pub component_unhealthy_below: f64,
    pub acceleration_warning: f64,
    pub volatility_warning: f64,
    pub max_recommendations: usize,
    pub critical_limits: CriticalMetricLimits,
    pub risk_bands: RiskBandsConfig,
}

impl Default for RulConfig {
    fn default() -> Self {
        Self {
            history_window_days: 30,
            min_pattern_samples: 3,
            confidence_sample_cap: 30,
            default_horizon_days: 365.0,
            fallback_confidence: 0.1,
            time_weight: 0.5,
            rate_weight: 0.3,
            acceleration_weight: 0.2,
            reference_days: 60.0,
            reference_rate_per_day: 5.0,
            reference_acceleration: 10.0,
            min_failure_probability: 0.05,
            max_failure_probability: 0.95,
            health_index_horizon_days: 30.0,
            health_time_weight: 0.6,
            rapid_degradation_rate: 2.0,
            rapid_degradation_discount: 0.9,
            component_days_per_health_point: 0.3,
            component_unhealthy_below: 50.0,
            acceleration_warning: 1.0,
            volatility_warning: 5.0,
            max_recommendations: 6,
            critical_limits: CriticalMetricLimits::default(),
            risk_bands: RiskBandsConfig::default(),
        }
    }
}

// ============================================================================
// Trend Analyzer
// ============================================================================

/// A candidate periodicity tested by the seasonality detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPeriodConfig {
    pub name: String,
    pub hours: f64,
}

impl SeasonalPeriodConfig {
    fn new(name: &str, hours: f64) -> Self {
        Self {
            name: name.to_string(),
            hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub default_window_hours: u32,
    pub min_samples: usize,
    /// |slope| below this is a stable trend
    pub stable_slope: f64,
    /// R² below this is a volatile trend
    pub volatile_r_squared: f64,
    pub iqr_multiplier: f64,
    pub z_score_threshold: f64,
    pub isolation_window_cap: usize,
    /// Window size is n / divisor, capped by `isolation_window_cap`
    pub isolation_window_divisor: usize,
    pub isolation_threshold: f64,
    pub anomaly_rate_elevated: f64,
    pub anomaly_rate_high: f64,
    pub anomaly_rate_critical: f64,
    pub forecast_horizon_hours: u32,
    pub smoothing_alpha: f64,
    pub seasonal_strength_threshold: f64,
    pub linear_r_squared_threshold: f64,
    pub autocorrelation_threshold: f64,
    pub seasonal_periods: Vec<SeasonalPeriodConfig>,
    pub alignment_tolerance_secs: f64,
    pub min_aligned_points: usize,
    pub max_lag_steps: usize,
    pub report_correlation_above: f64,
    pub significance_level: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            default_window_hours: 168,
            min_samples: 10,
            stable_slope: 0.001,
            volatile_r_squared: 0.1,
            iqr_multiplier: 1.5,
            z_score_threshold: 2.5,
            isolation_window_cap: 20,
            isolation_window_divisor: 5,
            isolation_threshold: 3.0,
            anomaly_rate_elevated: 0.05,
            anomaly_rate_high: 0.15,
            anomaly_rate_critical: 0.30,
            forecast_horizon_hours: 24,
            smoothing_alpha: 0.3,
            seasonal_strength_threshold: 0.4,
            linear_r_squared_threshold: 0.3,
            autocorrelation_threshold: 0.3,
            seasonal_periods: vec![
                SeasonalPeriodConfig::new("daily", 24.0),
                SeasonalPeriodConfig::new("weekly", 168.0),
                SeasonalPeriodConfig::new("shift", 8.0),
                SeasonalPeriodConfig::new("maintenance_cycle", 720.0),
            ],
            alignment_tolerance_secs: 300.0,
            min_aligned_points: 10,
            max_lag_steps: 10,
            report_correlation_above: 0.2,
            significance_level: 0.05,
        }
    }
}

// ============================================================================
// Fleet Roll-up
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Primary sensor streams analyzed per asset
    pub sensors_per_equipment: usize,
    pub anomaly_weight: f64,
    pub volatility_weight: f64,
    pub trend_penalty_weight: f64,
    /// Anomaly rate that saturates the anomaly component of the risk score
    pub anomaly_rate_scale: f64,
    /// Coefficient of variation that saturates the volatility component
    pub volatility_scale: f64,
    pub medium_anomaly_rate: f64,
    pub high_anomaly_rate: f64,
    pub critical_anomaly_rate: f64,
    pub medium_health_score: f64,
    pub high_health_score: f64,
    pub critical_health_score: f64,
    /// Per-asset anomaly rate that triggers an urgent maintenance recommendation
    pub urgent_anomaly_rate: f64,
    /// Per-asset coefficient of variation that triggers a monitoring recommendation
    pub monitoring_volatility: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            sensors_per_equipment: 2,
            anomaly_weight: 50.0,
            volatility_weight: 30.0,
            trend_penalty_weight: 20.0,
            anomaly_rate_scale: 0.30,
            volatility_scale: 0.50,
            medium_anomaly_rate: 0.05,
            high_anomaly_rate: 0.15,
            critical_anomaly_rate: 0.30,
            medium_health_score: 80.0,
            high_health_score: 60.0,
            critical_health_score: 40.0,
            urgent_anomaly_rate: 0.15,
            monitoring_volatility: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
[trend]
z_score_threshold = 3.0

[rul.risk_bands.critical]
probability = 0.75
remaining_days = 7.0
health_index = 30.0
probability_buffer = 0.05
days_buffer = 2.0
health_buffer = 5.0
"#,
        )
        .unwrap();
        assert!((config.trend.z_score_threshold - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.trend.min_samples, 10);
        assert!((config.rul.risk_bands.critical.probability - 0.75).abs() < f64::EPSILON);
        assert!((config.rul.risk_bands.critical.probability_buffer - 0.05).abs() < f64::EPSILON);
        assert!((config.rul.risk_bands.high.probability - 0.50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let mut config = EngineConfig::default();
        config.rul.risk_bands.critical.probability = 0.4;
        config.rul.risk_bands.critical.remaining_days = 30.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("critical.probability")));
                assert!(errors.iter().any(|e| e.contains("critical.remaining_days")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_alpha_and_negative_buffer_rejected() {
        let mut config = EngineConfig::default();
        config.trend.smoothing_alpha = 1.5;
        config.rul.risk_bands.high.days_buffer = -1.0;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn test_window_and_weight_bounds() {
        let huge = EngineConfig::from_toml_str("[rul]\nhistory_window_days = 9000000000000\n");
        let Err(ConfigError::Validation(errors)) = huge else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.contains("rul.history_window_days")));

        let mut config = EngineConfig::default();
        config.rul.health_time_weight = 1.2;
        config.rul.rapid_degradation_discount = -0.1;
        config.trend.default_window_hours = MAX_TREND_WINDOW_HOURS + 1;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.contains("health_time_weight")));
        assert!(errors.iter().any(|e| e.contains("rapid_degradation_discount")));
        assert!(errors.iter().any(|e| e.contains("default_window_hours")));

        config = EngineConfig::default();
        config.rul.history_window_days = MAX_HISTORY_WINDOW_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
