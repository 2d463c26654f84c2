//! Trend analyzer outputs: TrendAnalysisResult and its parts, FleetTrendSummary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RiskLevel;

// ============================================================================
// Statistical Summary
// ============================================================================

/// Analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Direction classification of the linear trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Volatile,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Stable => write!(f, "stable"),
            Self::Volatile => write!(f, "volatile"),
        }
    }
}

/// OLS fit of value against sample index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Approximate two-tailed p-value for the slope (simplified Student-t CDF)
    pub p_value: f64,
    pub direction: TrendDirection,
}

/// Coarse 68/95 rule check. This is not a Shapiro-Wilk test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityCheck {
    pub within_one_sigma: f64,
    pub within_two_sigma: f64,
    pub is_approximately_normal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub sample_count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0)
    pub kurtosis: f64,
    pub normality: NormalityCheck,
    pub trend: LinearTrend,
}

impl StatisticalSummary {
    /// Coefficient of variation, falling back to the raw std-dev around a zero mean
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean.abs() > f64::EPSILON {
            self.std_dev / self.mean.abs()
        } else {
            self.std_dev
        }
    }
}

// ============================================================================
// Anomaly Detection
// ============================================================================

/// Detector that flagged a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    Iqr,
    ZScore,
    IsolationWindow,
}

impl std::fmt::Display for AnomalyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iqr => write!(f, "iqr"),
            Self::ZScore => write!(f, "z_score"),
            Self::IsolationWindow => write!(f, "isolation_window"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Mild,
    Moderate,
    Severe,
    Extreme,
}

impl AnomalySeverity {
    /// Bin a deviation/scale ratio at 2 / 3 / 5
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 2.0 {
            Self::Mild
        } else if ratio < 3.0 {
            Self::Moderate
        } else if ratio < 5.0 {
            Self::Severe
        } else {
            Self::Extreme
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub expected_value: f64,
    pub deviation: f64,
    pub severity: AnomalySeverity,
    pub confidence: f64,
    pub method: AnomalyMethod,
    pub context: String,
}

/// Verdict on the overall anomaly rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLevel {
    Normal,
    Elevated,
    High,
    Critical,
}

/// How many points each detector flagged before merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorCounts {
    pub iqr: usize,
    pub z_score: usize,
    pub isolation_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    /// Merged anomalies, highest confidence first
    pub anomalies: Vec<AnomalyPoint>,
    pub anomaly_rate: f64,
    pub level: AnomalyLevel,
    pub recommendation: String,
    pub detector_counts: DetectorCounts,
}

// ============================================================================
// Forecasting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    Linear,
    ExponentialSmoothing,
    Seasonal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// In-sample fit errors (simplified: no hold-out split)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub rmse: f64,
    /// Percent; zero-valued actuals are skipped
    pub mape: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub method: ForecastMethod,
    pub horizon_hours: u32,
    pub points: Vec<ForecastPoint>,
    pub accuracy: ForecastAccuracy,
}

// ============================================================================
// Seasonality
// ============================================================================

/// Autocorrelation measured at one candidate period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalCandidate {
    pub name: String,
    pub period_hours: f64,
    pub lag_samples: usize,
    pub autocorrelation: f64,
    pub qualifies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantPeriod {
    pub name: String,
    pub period_hours: f64,
    pub lag_samples: usize,
    pub strength: f64,
    pub amplitude: f64,
    /// Offset of the cycle peak from the first sample
    pub phase_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub detected: bool,
    /// |autocorrelation| of the dominant period, 0 when none qualifies
    pub strength: f64,
    pub candidates: Vec<SeasonalCandidate>,
    pub dominant: Option<DominantPeriod>,
}

// ============================================================================
// Correlation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

/// Heuristic causality verdict from correlation magnitude and lag proximity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Causality {
    None,
    Possible,
    Likely,
    Strong,
}

/// Result of the +/- N step lag scan.
///
/// A positive `best_lag_steps` means the analyzed sensor leads the other one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagAnalysis {
    pub best_lag_steps: i32,
    pub lag_correlation: f64,
    pub leading_sensor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCorrelation {
    pub sensor_type: String,
    pub correlation: f64,
    pub p_value: f64,
    pub aligned_points: usize,
    pub relationship: Relationship,
    pub strength: CorrelationStrength,
    pub lag: LagAnalysis,
    pub causality: Causality,
}

/// Full analysis of one sensor stream on one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysisResult {
    pub equipment_id: String,
    pub sensor_type: String,
    pub time_range: TimeRange,
    pub statistical_summary: StatisticalSummary,
    pub anomaly_detection: AnomalyDetection,
    pub forecasting: Forecast,
    pub seasonality: Seasonality,
    pub correlations: Vec<SensorCorrelation>,
}

// ============================================================================
// Fleet Roll-up
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetAggregatedMetrics {
    pub equipment_analyzed: usize,
    pub equipment_skipped: usize,
    pub average_anomaly_rate: f64,
    /// Mean coefficient of variation across analyzed streams
    pub average_volatility: f64,
    /// Fraction of analyzed streams whose trend is not `volatile`
    pub trend_stability: f64,
    pub fleet_health_score: f64,
    pub maintenance_risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRanking {
    pub rank: usize,
    pub equipment_id: String,
    pub risk_score: f64,
    pub anomaly_rate: f64,
    pub volatility: f64,
    pub volatile_trend_fraction: f64,
    pub sensors_analyzed: Vec<String>,
    pub primary_concern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Urgent,
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetRecommendation {
    pub priority: RecommendationPriority,
    pub equipment_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetTrendSummary {
    pub generated_at: DateTime<Utc>,
    pub aggregated_metrics: FleetAggregatedMetrics,
    /// Highest risk first
    pub equipment_rankings: Vec<EquipmentRanking>,
    /// Most urgent first
    pub recommendations: Vec<FleetRecommendation>,
}
