//! Input records read from the telemetry and degradation store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading of a single sensor stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
}

impl SensorSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            timestamp,
            value,
            unit: unit.into(),
        }
    }
}

/// Component-level degradation measurement.
///
/// `degradation_metric` is on a 0-100 scale where 100 means failed.
/// `degradation_rate` (points/day) is derived once, when the record is written,
/// from the previous record for the same equipment + component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationRecord {
    pub equipment_id: String,
    pub component_type: String,
    pub timestamp: DateTime<Utc>,
    pub degradation_metric: f64,
    #[serde(default)]
    pub vibration_level: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub oil_condition: Option<f64>,
    #[serde(default)]
    pub wear_particle_count: Option<f64>,
    pub degradation_rate: f64,
}

/// New measurement submitted to `RulEngine::record_degradation`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationMetrics {
    pub degradation_metric: f64,
    pub vibration_level: Option<f64>,
    pub temperature: Option<f64>,
    pub oil_condition: Option<f64>,
    pub wear_particle_count: Option<f64>,
}

impl DegradationMetrics {
    pub fn new(degradation_metric: f64) -> Self {
        Self {
            degradation_metric,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_vibration(mut self, level: f64) -> Self {
        self.vibration_level = Some(level);
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    #[must_use]
    pub const fn with_oil_condition(mut self, condition: f64) -> Self {
        self.oil_condition = Some(condition);
        self
    }

    #[must_use]
    pub const fn with_wear_particles(mut self, count: f64) -> Self {
        self.wear_particle_count = Some(count);
        self
    }
}

/// ML-origin failure prediction, produced by a separate training/serving subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePrediction {
    pub equipment_id: String,
    pub prediction_timestamp: DateTime<Utc>,
    pub failure_probability: f64,
    #[serde(default)]
    pub predicted_failure_date: Option<DateTime<Utc>>,
    pub confidence: f64,
    pub model_id: String,
    pub model_type: String,
}

/// Broad asset class, used to tailor maintenance wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Engine,
    Pump,
    Compressor,
    Generator,
    Other,
}

impl EquipmentKind {
    /// Classify a free-form equipment type string ("Centrifugal Pump", "diesel_engine", ...)
    pub fn classify(equipment_type: &str) -> Self {
        let lower = equipment_type.to_ascii_lowercase();
        if lower.contains("pump") {
            Self::Pump
        } else if lower.contains("compressor") {
            Self::Compressor
        } else if lower.contains("generator") {
            Self::Generator
        } else if lower.contains("engine") || lower.contains("motor") {
            Self::Engine
        } else {
            Self::Other
        }
    }
}

/// Asset registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub equipment_id: String,
    pub equipment_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl EquipmentRecord {
    pub fn new(equipment_id: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            equipment_type: equipment_type.into(),
            name: None,
        }
    }

    pub fn kind(&self) -> EquipmentKind {
        EquipmentKind::classify(&self.equipment_type)
    }
}

/// Quality tier of the data an ML model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQualityTier {
    Gold,
    Silver,
    Bronze,
    Synthetic,
}

impl DataQualityTier {
    /// Confidence multiplier applied when the model publishes a tier but no explicit multiplier
    pub const fn confidence_multiplier(self) -> f64 {
        match self {
            Self::Gold => 1.0,
            Self::Silver => 0.9,
            Self::Bronze => 0.75,
            Self::Synthetic => 0.6,
        }
    }
}

/// Metadata published alongside an ML model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    #[serde(default)]
    pub confidence_multiplier: Option<f64>,
    #[serde(default)]
    pub data_quality_tier: Option<DataQualityTier>,
}

impl ModelMetadata {
    /// Effective multiplier: explicit value first, then the tier default
    pub fn effective_multiplier(&self) -> Option<f64> {
        self.confidence_multiplier
            .or_else(|| self.data_quality_tier.map(DataQualityTier::confidence_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_kind_classification() {
        assert_eq!(EquipmentKind::classify("Centrifugal Pump"), EquipmentKind::Pump);
        assert_eq!(EquipmentKind::classify("diesel_engine"), EquipmentKind::Engine);
        assert_eq!(EquipmentKind::classify("Screw Compressor"), EquipmentKind::Compressor);
        assert_eq!(EquipmentKind::classify("standby generator"), EquipmentKind::Generator);
        assert_eq!(EquipmentKind::classify("conveyor"), EquipmentKind::Other);
    }

    #[test]
    fn test_explicit_multiplier_beats_tier() {
        let meta = ModelMetadata {
            model_id: "m1".to_string(),
            confidence_multiplier: Some(0.5),
            data_quality_tier: Some(DataQualityTier::Gold),
        };
        assert_eq!(meta.effective_multiplier(), Some(0.5));

        let tier_only = ModelMetadata {
            model_id: "m2".to_string(),
            confidence_multiplier: None,
            data_quality_tier: Some(DataQualityTier::Bronze),
        };
        assert_eq!(tier_only.effective_multiplier(), Some(0.75));

        let empty = ModelMetadata {
            model_id: "m3".to_string(),
            confidence_multiplier: None,
            data_quality_tier: None,
        };
        assert_eq!(empty.effective_multiplier(), None);
    }
}
