//! Store access abstraction
//!
//! The prognostics core owns no persistence. Everything it reads comes through
//! [`PrognosticsStore`], which the host system implements on top of its
//! relational store. Every call carries an [`OrgId`]: the core never invents a
//! default tenant and never aggregates across tenants.
//!
//! [`InMemoryStore`] is a complete in-process implementation used by tests and
//! the `fleet-sim` binary.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    DegradationRecord, EquipmentRecord, FailurePrediction, ModelMetadata, SensorSample,
};

/// Tenant / organization identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Failures reported by a store implementation. Passed through to callers unchanged.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Tenant-scoped reads (plus the single append) the prognostics core needs.
#[async_trait]
pub trait PrognosticsStore: Send + Sync {
    /// Most recent ML-origin failure prediction for an asset
    async fn get_latest_failure_prediction(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Option<FailurePrediction>, StoreError>;

    /// Degradation records at or after `since`, any component
    async fn get_degradation_history(
        &self,
        org: &OrgId,
        equipment_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DegradationRecord>, StoreError>;

    /// Asset registry entry; `None` for an unknown asset
    async fn get_equipment_record(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Option<EquipmentRecord>, StoreError>;

    /// Samples of one sensor stream within `[start, end]`, in store order
    async fn get_telemetry_history(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorSample>, StoreError>;

    /// Sensor types present on an asset, primary sensors first
    async fn get_equipment_sensor_types(
        &self,
        org: &OrgId,
        equipment_id: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Metadata of an ML model
    async fn get_model_metadata(
        &self,
        org: &OrgId,
        model_id: &str,
    ) -> Result<Option<ModelMetadata>, StoreError>;

    /// Latest degradation record for one equipment + component, regardless of age
    async fn get_latest_degradation_record(
        &self,
        org: &OrgId,
        equipment_id: &str,
        component_type: &str,
    ) -> Result<Option<DegradationRecord>, StoreError>;

    /// Append one degradation record
    async fn append_degradation_record(
        &self,
        org: &OrgId,
        record: DegradationRecord,
    ) -> Result<(), StoreError>;
}
