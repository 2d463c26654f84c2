//! RUL Engine
//!
//! Pulls the latest ML failure prediction and a rolling window of component
//! degradation records for one asset, then fits, reconciles, scores and
//! classifies them into a single [`RulPrediction`].
//!
//! ## Pipeline
//!
//! ```text
//! store reads ──► degradation fit ──► reconcile with ML ──► component health
//!                                                         │
//!            recommendations ◄── risk (hysteresis) ◄── health index
//! ```
//!
//! The engine holds no per-asset memory. Callers that want flap-dampening
//! across calls persist the returned risk level and pass it to
//! [`RulEngine::calculate_rul_with_previous`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, RulConfig};
use crate::error::AnalyticsError;
use crate::observability::{EngineObserver, TracingObserver};
use crate::store::{OrgId, PrognosticsStore};
use crate::types::{DegradationMetrics, DegradationRecord, RiskLevel, RulPrediction};

use super::degradation::DegradationAnalyzer;
use super::health::{component_statuses, health_index};
use super::reconcile::reconcile;
use super::recommendations::build_recommendations;
use super::risk::{RiskClassifier, RiskSignals};

pub struct RulEngine {
    store: Arc<dyn PrognosticsStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn EngineObserver>,
    config: RulConfig,
    classifier: RiskClassifier,
}

impl RulEngine {
    /// Engine with default configuration, system clock and tracing observer
    pub fn new(store: Arc<dyn PrognosticsStore>) -> Self {
        let config = RulConfig::default();
        Self {
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
            classifier: RiskClassifier::new(config.risk_bands.clone()),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: RulConfig) -> Self {
        self.classifier = RiskClassifier::new(config.risk_bands.clone());
        self.config = config;
        self
    }

    /// RUL prediction for one asset. `Ok(None)` when the asset is unknown.
    pub async fn calculate_rul(
        &self,
        equipment_id: &str,
        org: &OrgId,
    ) -> Result<Option<RulPrediction>, AnalyticsError> {
        self.calculate_rul_with_previous(equipment_id, org, None).await
    }

    /// Like [`calculate_rul`](Self::calculate_rul), with the caller's last known
    /// risk level fed into the hysteresis classifier
    pub async fn calculate_rul_with_previous(
        &self,
        equipment_id: &str,
        org: &OrgId,
        previous: Option<RiskLevel>,
    ) -> Result<Option<RulPrediction>, AnalyticsError> {
        let Some(equipment) = self.store.get_equipment_record(org, equipment_id).await? else {
            self.observer.unknown_equipment(org, equipment_id);
            return Ok(None);
        };

        let now = self.clock.now();
        let window_days = self.config.history_window_days;
        let since = Duration::try_days(window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                ConfigError::Validation(vec![format!(
                    "rul.history_window_days ({window_days}) is outside the representable time range"
                )])
            })?;

        let (prediction, history) = futures::try_join!(
            self.store.get_latest_failure_prediction(org, equipment_id),
            self.store.get_degradation_history(org, equipment_id, since),
        )?;

        let metadata = match &prediction {
            Some(p) => self.store.get_model_metadata(org, &p.model_id).await?,
            None => None,
        };

        debug!(
            equipment_id = %equipment_id,
            records = history.len(),
            has_ml_prediction = prediction.is_some(),
            "Computing RUL"
        );

        // ====================================================================
        // Fit and reconcile
        // ====================================================================
        let patterns = DegradationAnalyzer::fit_all(&history, &self.config);
        let governing = DegradationAnalyzer::governing(&patterns);
        let estimate = reconcile(
            prediction.as_ref(),
            metadata.as_ref(),
            governing,
            now,
            &self.config,
        );

        // ====================================================================
        // Health and risk
        // ====================================================================
        let components = component_statuses(&history, &patterns, &self.config);
        let governing_rate = governing.map_or(0.0, |p| p.degradation_per_day);
        let health = health_index(estimate.remaining_days, &components, governing_rate, &self.config);

        let risk_level = self.classifier.classify(
            &RiskSignals {
                failure_probability: estimate.failure_probability,
                remaining_days: estimate.remaining_days,
                health_index: health,
            },
            previous,
        );

        let recommendations = build_recommendations(
            risk_level,
            &components,
            governing,
            equipment.kind(),
            &self.config,
        );

        let prediction = RulPrediction {
            equipment_id: equipment_id.to_string(),
            remaining_days: estimate.remaining_days,
            confidence_score: estimate.confidence,
            health_index: health,
            degradation_rate: governing_rate,
            failure_probability: estimate.failure_probability,
            risk_level,
            component_status: components,
            prediction_method: estimate.method,
            recommendations,
            generated_at: now,
        };

        self.observer.rul_computed(org, &prediction);
        Ok(Some(prediction))
    }

    /// RUL for many assets concurrently. Unknown assets and failed assets are
    /// omitted; failures go to the observer.
    pub async fn calculate_batch_rul(
        &self,
        equipment_ids: &[String],
        org: &OrgId,
    ) -> HashMap<String, RulPrediction> {
        let results = join_all(
            equipment_ids
                .iter()
                .map(|id| async move { (id, self.calculate_rul(id, org).await) }),
        )
        .await;

        let mut predictions = HashMap::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(Some(prediction)) => {
                    predictions.insert(id.clone(), prediction);
                }
                Ok(None) => {}
                Err(e) => self.observer.asset_skipped(org, id, &e),
            }
        }
        predictions
    }

    /// Append a new degradation measurement, deriving its rate from the
    /// previous record for the same asset and component
    pub async fn record_degradation(
        &self,
        org: &OrgId,
        equipment_id: &str,
        component_type: &str,
        metrics: DegradationMetrics,
    ) -> Result<DegradationRecord, AnalyticsError> {
        let metric = metrics.degradation_metric;
        if !metric.is_finite() || !(0.0..=100.0).contains(&metric) {
            return Err(AnalyticsError::InvalidMeasurement {
                field: "degradation_metric".to_string(),
                reason: format!("{metric} is outside 0..=100"),
            });
        }

        let now = self.clock.now();
        let previous = self
            .store
            .get_latest_degradation_record(org, equipment_id, component_type)
            .await?;

        let record = DegradationRecord {
            equipment_id: equipment_id.to_string(),
            component_type: component_type.to_string(),
            timestamp: now,
            degradation_metric: metric,
            vibration_level: metrics.vibration_level,
            temperature: metrics.temperature,
            oil_condition: metrics.oil_condition,
            wear_particle_count: metrics.wear_particle_count,
            degradation_rate: DegradationAnalyzer::rate_since(previous.as_ref(), metric, now),
        };

        self.store.append_degradation_record(org, record.clone()).await?;
        self.observer.degradation_recorded(org, &record);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::observability::CountingObserver;
    use crate::store::InMemoryStore;
    use crate::types::{EquipmentRecord, FailurePrediction, PredictionMethod};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap()
    }

    async fn setup() -> (Arc<InMemoryStore>, Arc<FixedClock>, Arc<CountingObserver>, RulEngine) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(now()));
        let observer = Arc::new(CountingObserver::new());
        let engine = RulEngine::new(store.clone())
            .with_clock(clock.clone())
            .with_observer(observer.clone());
        (store, clock, observer, engine)
    }

    #[tokio::test]
    async fn test_unknown_equipment_is_none() {
        let (_, _, observer, engine) = setup().await;
        let org = OrgId::new("acme");
        let result = engine.calculate_rul("ghost", &org).await.unwrap();
        assert!(result.is_none());
        assert_eq!(observer.snapshot().unknown_equipment, 1);
    }

    #[tokio::test]
    async fn test_no_history_uses_default_horizon() {
        let (store, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("gen-1", "generator")).await;

        let rul = engine.calculate_rul("gen-1", &org).await.unwrap().unwrap();
        assert!((rul.remaining_days - 365.0).abs() < f64::EPSILON);
        assert_eq!(rul.prediction_method, PredictionMethod::Statistical);
        assert_eq!(rul.risk_level, RiskLevel::Low);
        assert!((rul.health_index - 100.0).abs() < f64::EPSILON);
        assert_eq!(rul.recommendations, vec!["Continue routine monitoring".to_string()]);
    }

    #[tokio::test]
    async fn test_ml_prediction_drives_result() {
        let (store, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("cmp-2", "compressor")).await;
        store
            .insert_failure_prediction(
                &org,
                FailurePrediction {
                    equipment_id: "cmp-2".to_string(),
                    prediction_timestamp: now() - Duration::hours(1),
                    failure_probability: 0.8,
                    predicted_failure_date: Some(now() + Duration::days(5)),
                    confidence: 0.7,
                    model_id: "m-1".to_string(),
                    model_type: "lstm".to_string(),
                },
            )
            .await;

        let rul = engine.calculate_rul("cmp-2", &org).await.unwrap().unwrap();
        assert_eq!(rul.prediction_method, PredictionMethod::MlLstm);
        assert!((rul.remaining_days - 5.0).abs() < 1e-9);
        assert_eq!(rul.risk_level, RiskLevel::Critical);
        assert!(rul.recommendations[0].starts_with("URGENT"));
    }

    #[tokio::test]
    async fn test_previous_level_dampens_escalation() {
        let (store, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("pmp-4", "pump")).await;
        store
            .insert_failure_prediction(
                &org,
                FailurePrediction {
                    equipment_id: "pmp-4".to_string(),
                    prediction_timestamp: now(),
                    failure_probability: 0.67,
                    predicted_failure_date: Some(now() + Duration::days(200)),
                    confidence: 0.6,
                    model_id: "m-2".to_string(),
                    model_type: "random_forest".to_string(),
                },
            )
            .await;

        let stateless = engine.calculate_rul("pmp-4", &org).await.unwrap().unwrap();
        assert_eq!(stateless.risk_level, RiskLevel::Critical);

        let held = engine
            .calculate_rul_with_previous("pmp-4", &org, Some(RiskLevel::High))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(held.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_record_degradation_derives_rate() {
        let (store, clock, observer, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("eng-9", "engine")).await;

        let first = engine
            .record_degradation(&org, "eng-9", "turbocharger", DegradationMetrics::new(20.0))
            .await
            .unwrap();
        assert!(first.degradation_rate.abs() < f64::EPSILON);

        clock.advance(Duration::days(2));
        let second = engine
            .record_degradation(&org, "eng-9", "turbocharger", DegradationMetrics::new(26.0))
            .await
            .unwrap();
        assert!((second.degradation_rate - 3.0).abs() < 1e-9);
        assert_eq!(observer.snapshot().degradation_recorded, 2);
    }

    #[tokio::test]
    async fn test_record_degradation_rejects_out_of_range() {
        let (_, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        for bad in [-1.0, 100.5, f64::NAN] {
            let err = engine
                .record_degradation(&org, "eng-9", "turbocharger", DegradationMetrics::new(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidMeasurement { .. }));
        }
    }

    #[tokio::test]
    async fn test_batch_omits_unknown_and_failed() {
        let (store, _, observer, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("a", "pump")).await;
        store.insert_equipment(&org, EquipmentRecord::new("b", "pump")).await;
        store.fail_equipment("b").await;

        let ids = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        let results = engine.calculate_batch_rul(&ids, &org).await;
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("a"));
        assert_eq!(observer.snapshot().assets_skipped, 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("x", "pump")).await;
        store.fail_equipment("x").await;
        let err = engine.calculate_rul("x", &org).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Store(_)));
    }

    #[tokio::test]
    async fn test_unrepresentable_history_window_is_config_error() {
        let (store, _, _, engine) = setup().await;
        let org = OrgId::new("acme");
        store.insert_equipment(&org, EquipmentRecord::new("p", "pump")).await;
        let engine = engine.with_config(RulConfig {
            history_window_days: 9_000_000_000_000,
            ..RulConfig::default()
        });

        let err = engine.calculate_rul("p", &org).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(ConfigError::Validation(_))));
    }
}
