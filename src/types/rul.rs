//! RUL engine outputs: RulPrediction, ComponentHealthStatus, RiskLevel, etc.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered risk classification. `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Which source produced the remaining-days figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    MlLstm,
    MlRf,
    Hybrid,
    Statistical,
}

impl PredictionMethod {
    /// Map an ML model type string onto a prediction method
    pub fn from_model_type(model_type: &str) -> Self {
        let lower = model_type.to_ascii_lowercase();
        if lower.contains("lstm") {
            Self::MlLstm
        } else if lower.contains("forest") {
            Self::MlRf
        } else {
            Self::Hybrid
        }
    }

    pub const fn is_ml(self) -> bool {
        !matches!(self, Self::Statistical)
    }
}

impl std::fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MlLstm => write!(f, "ml_lstm"),
            Self::MlRf => write!(f, "ml_rf"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::Statistical => write!(f, "statistical"),
        }
    }
}

/// Condition-monitoring channel that exceeded its limit on a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalMetric {
    Vibration,
    Temperature,
    OilCondition,
    WearParticles,
}

impl std::fmt::Display for CriticalMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vibration => write!(f, "vibration"),
            Self::Temperature => write!(f, "temperature"),
            Self::OilCondition => write!(f, "oil_condition"),
            Self::WearParticles => write!(f, "wear_particles"),
        }
    }
}

/// Least-squares fit of one component's degradation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationPattern {
    pub component_type: String,
    pub sample_count: usize,
    /// Fitted slope per sample index
    pub slope_per_sample: f64,
    /// Slope converted to points/day via the mean sampling interval
    pub degradation_per_day: f64,
    pub latest_value: f64,
    /// Days until the metric reaches 100; `None` when the component is not degrading
    pub time_to_failure_days: Option<f64>,
    pub r_squared: f64,
    /// RMS residual of the fit
    pub volatility: f64,
    /// Second difference of the last three measurements
    pub acceleration: f64,
    pub confidence: f64,
}

/// Health of one component on the asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealthStatus {
    pub component_type: String,
    pub health_score: f64,
    pub degradation_metric: f64,
    pub degradation_rate: f64,
    pub predicted_failure_days: f64,
    pub confidence: f64,
    pub critical_metrics: Vec<CriticalMetric>,
}

/// Remaining-useful-life prediction for one asset, built fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulPrediction {
    pub equipment_id: String,
    pub remaining_days: f64,
    /// Always within [0, 0.95]
    pub confidence_score: f64,
    /// Always within [0, 100]
    pub health_index: f64,
    pub degradation_rate: f64,
    /// Always within [0, 1]
    pub failure_probability: f64,
    pub risk_level: RiskLevel,
    pub component_status: Vec<ComponentHealthStatus>,
    pub prediction_method: PredictionMethod,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl RulPrediction {
    /// Status of a single component, if it was measured in the history window
    pub fn component(&self, component_type: &str) -> Option<&ComponentHealthStatus> {
        self.component_status
            .iter()
            .find(|c| c.component_type == component_type)
    }
}
