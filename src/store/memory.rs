//! In-memory `PrognosticsStore` used by tests and the simulation binary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

use super::{OrgId, PrognosticsStore, StoreError};
use crate::types::{
    DegradationRecord, EquipmentRecord, FailurePrediction, ModelMetadata, SensorSample,
};

/// Everything one tenant owns
#[derive(Debug, Default)]
struct TenantData {
    equipment: HashMap<String, EquipmentRecord>,
    predictions: HashMap<String, Vec<FailurePrediction>>,
    degradation: HashMap<String, Vec<DegradationRecord>>,
    /// equipment_id -> sensor types in registration order
    sensor_order: HashMap<String, Vec<String>>,
    telemetry: HashMap<(String, String), Vec<SensorSample>>,
    models: HashMap<String, ModelMetadata>,
}

/// Tenant-partitioned in-memory store.
///
/// Equipment ids registered with [`InMemoryStore::fail_equipment`] return
/// `StoreError::Backend` from every read, for exercising error isolation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tenants: RwLock<HashMap<OrgId, TenantData>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_equipment(&self, org: &OrgId, record: EquipmentRecord) {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        tenant.equipment.insert(record.equipment_id.clone(), record);
    }

    pub async fn insert_failure_prediction(&self, org: &OrgId, prediction: FailurePrediction) {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        tenant
            .predictions
            .entry(prediction.equipment_id.clone())
            .or_default()
            .push(prediction);
    }

    pub async fn insert_model_metadata(&self, org: &OrgId, metadata: ModelMetadata) {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        tenant.models.insert(metadata.model_id.clone(), metadata);
    }

    /// Insert pre-computed degradation history (rates are taken as given)
    pub async fn insert_degradation_records(
        &self,
        org: &OrgId,
        records: impl IntoIterator<Item = DegradationRecord>,
    ) {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        for record in records {
            tenant
                .degradation
                .entry(record.equipment_id.clone())
                .or_default()
                .push(record);
        }
    }

    /// Append samples to a sensor stream, registering the sensor type on first use
    pub async fn insert_samples(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        samples: impl IntoIterator<Item = SensorSample>,
    ) {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        let order = tenant
            .sensor_order
            .entry(equipment_id.to_string())
            .or_default();
        if !order.iter().any(|s| s == sensor_type) {
            order.push(sensor_type.to_string());
        }
        tenant
            .telemetry
            .entry((equipment_id.to_string(), sensor_type.to_string()))
            .or_default()
            .extend(samples);
    }

    /// Make every read for this equipment id fail
    pub async fn fail_equipment(&self, equipment_id: &str) {
        self.failing.write().await.insert(equipment_id.to_string());
    }

    async fn check_failing(&self, equipment_id: &str) -> Result<(), StoreError> {
        if self.failing.read().await.contains(equipment_id) {
            return Err(StoreError::Backend(format!(
                "injected failure for equipment {equipment_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PrognosticsStore for InMemoryStore {
    async fn get_latest_failure_prediction(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Option<FailurePrediction>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(org)
            .and_then(|t| t.predictions.get(equipment_id))
            .and_then(|list| list.iter().max_by_key(|p| p.prediction_timestamp))
            .cloned())
    }

    async fn get_degradation_history(
        &self,
        org: &OrgId,
        equipment_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DegradationRecord>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        let mut records: Vec<DegradationRecord> = tenants
            .get(org)
            .and_then(|t| t.degradation.get(equipment_id))
            .map(|list| {
                list.iter()
                    .filter(|r| r.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    async fn get_equipment_record(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Option<EquipmentRecord>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(org)
            .and_then(|t| t.equipment.get(equipment_id))
            .cloned())
    }

    async fn get_telemetry_history(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorSample>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        let key = (equipment_id.to_string(), sensor_type.to_string());
        let samples = tenants
            .get(org)
            .and_then(|t| t.telemetry.get(&key))
            .map(|list| {
                list.iter()
                    .filter(|s| s.timestamp >= start && s.timestamp <= end)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        debug!(
            org = %org,
            equipment_id = %equipment_id,
            sensor_type = %sensor_type,
            count = samples.len(),
            "Telemetry window read"
        );
        Ok(samples)
    }

    async fn get_equipment_sensor_types(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(org)
            .and_then(|t| t.sensor_order.get(equipment_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_model_metadata(
        &self,
        org: &OrgId,
        model_id: &str,
    ) -> Result<Option<ModelMetadata>, StoreError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(org)
            .and_then(|t| t.models.get(model_id))
            .cloned())
    }

    async fn get_latest_degradation_record(
        &self,
        org: &OrgId,
        equipment_id: &str,
        component_type: &str,
    ) -> Result<Option<DegradationRecord>, StoreError> {
        self.check_failing(equipment_id).await?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(org)
            .and_then(|t| t.degradation.get(equipment_id))
            .and_then(|list| {
                list.iter()
                    .filter(|r| r.component_type == component_type)
                    .max_by_key(|r| r.timestamp)
            })
            .cloned())
    }

    async fn append_degradation_record(
        &self,
        org: &OrgId,
        record: DegradationRecord,
    ) -> Result<(), StoreError> {
        self.check_failing(&record.equipment_id).await?;
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(org.clone()).or_default();
        tenant
            .degradation
            .entry(record.equipment_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let store = InMemoryStore::new();
        let acme = OrgId::new("acme");
        let globex = OrgId::new("globex");
        store
            .insert_equipment(&acme, EquipmentRecord::new("pump-1", "pump"))
            .await;

        assert!(store
            .get_equipment_record(&acme, "pump-1")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_equipment_record(&globex, "pump-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sensor_types_keep_registration_order() {
        let store = InMemoryStore::new();
        let org = OrgId::new("acme");
        for sensor in ["vibration", "temperature", "pressure", "vibration"] {
            store
                .insert_samples(&org, "eng-1", sensor, [SensorSample::new(t0(), 1.0, "u")])
                .await;
        }
        let types = store.get_equipment_sensor_types(&org, "eng-1").await.unwrap();
        assert_eq!(types, vec!["vibration", "temperature", "pressure"]);
    }

    #[tokio::test]
    async fn test_telemetry_window_filter() {
        let store = InMemoryStore::new();
        let org = OrgId::new("acme");
        let samples = (0..10).map(|i| SensorSample::new(t0() + Duration::hours(i), i as f64, "C"));
        store.insert_samples(&org, "eng-1", "temperature", samples).await;

        let window = store
            .get_telemetry_history(
                &org,
                "eng-1",
                "temperature",
                t0() + Duration::hours(2),
                t0() + Duration::hours(5),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 4);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryStore::new();
        let org = OrgId::new("acme");
        store.fail_equipment("bad-1").await;
        let result = store.get_equipment_sensor_types(&org, "bad-1").await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
